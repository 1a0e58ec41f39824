//! Glob patterns over flattened command strings.
//!
//! `*` matches any run of characters except `/`; `**` matches anything,
//! including `/` and the empty string. Braces that do not form a counted
//! repetition are escaped; every other character is passed to the regex engine
//! untouched, so regex metacharacters in a pattern keep their regex meaning. A pattern the regex engine rejects never matches anything other than
//! its own literal text.

use regex::Regex;

/// Expansion of a single `*`.
const SEGMENT: &str = "[^/]*";
/// Expansion of a `**` run.
const ANY_DEPTH: &str = ".*";

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: String,
    /// `None` when translation produced an invalid expression.
    regex: Option<Regex>,
}

impl Glob {
    /// Compile a pattern. Compilation errors are kept as "never matches"
    /// rather than surfaced, so a bad rule cannot approve anything.
    pub fn new(pattern: &str) -> Self {
        let regex = match Regex::new(&translate(pattern)) {
            Ok(re) => Some(re),
            Err(e) => {
                log::debug!("glob {pattern:?} does not compile, treating as literal: {e}");
                None
            }
        };
        Self {
            pattern: pattern.to_string(),
            regex,
        }
    }

    /// The pattern text this glob was built from.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Whether the glob compiled into a usable matcher.
    pub fn is_valid(&self) -> bool {
        self.regex.is_some()
    }

    /// Whole-subject match. Literal equality always matches, even when the
    /// pattern contains characters the regex engine would interpret.
    pub fn is_match(&self, subject: &str) -> bool {
        if self.pattern == subject {
            return true;
        }
        self.regex.as_ref().is_some_and(|re| re.is_match(subject))
    }
}

/// One-shot match of `subject` against `pattern`.
pub fn matches(pattern: &str, subject: &str) -> bool {
    // Same fast path as `Glob::is_match`; skips compiling for exact rules.
    if pattern == subject {
        return true;
    }
    Glob::new(pattern).is_match(subject)
}

/// Translate a glob into an anchored regular expression.
///
/// `**` runs are consumed before single `*`, pairwise from the left, so `***`
/// becomes `.*[^/]*`. Braces stay quantifiers only in the counted forms
/// `{m}`, `{m,}`, `{,n}` and `{m,n}`; any other `{` or `}` is literal, so
/// `rm {}` and `{a,b}` compile.
pub fn translate(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("^(?:");
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                out.push_str(ANY_DEPTH);
                i += 2;
            }
            '*' => {
                out.push_str(SEGMENT);
                i += 1;
            }
            // An escaped character passes through, except `*`, which is
            // still expanded on the next step.
            '\\' => {
                out.push('\\');
                match chars.get(i + 1) {
                    Some(&c) if c != '*' => {
                        out.push(c);
                        i += 2;
                    }
                    _ => i += 1,
                }
            }
            '{' => match counted_repetition(&chars[i..]) {
                Some((len, quantifier)) => {
                    out.push_str(&quantifier);
                    i += len;
                }
                None => {
                    out.push_str("\\{");
                    i += 1;
                }
            },
            '}' => {
                out.push_str("\\}");
                i += 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    out.push_str(")$");
    out
}

/// Recognise a counted repetition at the start of `chars` (which begins with
/// `{`). Returns its length and the equivalent quantifier with an explicit
/// lower bound.
fn counted_repetition(chars: &[char]) -> Option<(usize, String)> {
    let digits = |from: usize| {
        chars[from..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .collect::<String>()
    };
    let lo = digits(1);
    let mut end = 1 + lo.len();
    let hi = if chars.get(end) == Some(&',') {
        let hi = digits(end + 1);
        end += 1 + hi.len();
        Some(hi)
    } else {
        None
    };
    if chars.get(end) != Some(&'}') {
        return None;
    }
    let quantifier = match hi {
        None if lo.is_empty() => return None,
        None => format!("{{{lo}}}"),
        Some(hi) => {
            let lo = if lo.is_empty() { "0" } else { lo.as_str() };
            format!("{{{lo},{hi}}}")
        }
    };
    Some((end + 1, quantifier))
}
