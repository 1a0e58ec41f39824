//! Rule grammar: `Tool(pattern)`.

use std::sync::LazyLock;

use regex::Regex;

/// `Name(body)` anchored at both ends. The body is captured greedily up to the
/// final `)`, so nested parentheses survive but cannot be escaped.
static RULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\((.*)\)$").expect("rule grammar must compile"));

/// A permission rule decoded from its raw string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRule {
    /// Tool identifier, e.g. `Bash`.
    pub tool: String,
    /// Glob pattern body; may be empty for `Bash()`.
    pub pattern: String,
}

impl ParsedRule {
    /// Decode a raw rule string. Returns `None` when the string does not follow
    /// the `Name(pattern)` grammar; callers skip such rules.
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = RULE_RE.captures(raw)?;
        Some(Self {
            tool: caps[1].to_string(),
            pattern: caps[2].to_string(),
        })
    }

    /// Whether this rule targets the given tool.
    pub fn is_for(&self, tool: &str) -> bool {
        self.tool == tool
    }
}
