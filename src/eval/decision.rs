/// Outcome of evaluating one invocation.
///
/// `Deny` means "do not auto-approve": the wrapped tool still runs and falls
/// back to its own confirmation behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Approve,
    Deny,
}

impl Verdict {
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Approve => "APPROVE",
            Verdict::Deny => "DENY",
        }
    }

    pub fn is_approve(self) -> bool {
        self == Verdict::Approve
    }
}

/// A verdict together with what decided it.
#[derive(Debug, Clone)]
pub struct Ruling {
    pub verdict: Verdict,
    pub reason: String,
}

impl Ruling {
    pub(crate) fn approve(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Approve,
            reason: reason.into(),
        }
    }

    pub(crate) fn deny(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Deny,
            reason: reason.into(),
        }
    }
}
