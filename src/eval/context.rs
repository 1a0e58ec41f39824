/// The invocation being judged: the wrapper's arguments and the flattened
/// command string rules are matched against.
#[derive(Debug)]
pub struct InvocationContext<'a> {
    /// Arguments as received, program name excluded.
    pub args: &'a [String],
    /// Arguments joined by a single space. Quoting and embedded spaces are
    /// lost here; patterns are written against this form.
    pub command: String,
}

impl<'a> InvocationContext<'a> {
    pub fn new(args: &'a [String]) -> Self {
        Self {
            args,
            command: args.join(" "),
        }
    }

    /// First argument that is exactly one of `flags`.
    pub fn find_flag(&self, flags: &[String]) -> Option<&'a str> {
        self.args
            .iter()
            .find(|a| flags.contains(a))
            .map(String::as_str)
    }

    /// Whether any argument starts with `prefix` (catches `--flag=value`).
    pub fn has_flag_prefix(&self, prefix: &str) -> bool {
        self.args.iter().any(|a| a.starts_with(prefix))
    }
}
