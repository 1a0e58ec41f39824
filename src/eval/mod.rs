pub mod context;
pub mod decision;

pub use context::InvocationContext;
pub use decision::{Ruling, Verdict};

use crate::config::Config;
use crate::parse::{Glob, ParsedRule};
use crate::policy::PolicySet;

/// The only tool identifier the engine evaluates. Rules naming other tools
/// stay in the policy but never influence a verdict.
pub const BASH_TOOL: &str = "Bash";

/// A policy rule ready for matching.
#[derive(Debug)]
struct CompiledRule {
    raw: String,
    glob: Glob,
}

/// Compile the rules the engine will consult, in policy order.
///
/// Skips strings that fail the rule grammar, rules for other tools, and
/// rules with an empty pattern.
fn compile_rules(raw_rules: &[String]) -> Vec<CompiledRule> {
    let mut rules = Vec::new();
    for raw in raw_rules {
        let Some(rule) = ParsedRule::parse(raw) else {
            log::trace!("ignoring malformed rule {raw:?}");
            continue;
        };
        if !rule.is_for(BASH_TOOL) || rule.pattern.is_empty() {
            continue;
        }
        rules.push(CompiledRule {
            raw: raw.clone(),
            glob: Glob::new(&rule.pattern),
        });
    }
    rules
}

/// Deny-first decision engine over a merged [`PolicySet`].
pub struct Engine {
    deny: Vec<CompiledRule>,
    allow: Vec<CompiledRule>,
    safe_substrings: Vec<String>,
    override_flags: Vec<String>,
}

impl Engine {
    /// Build an engine from a policy, the known-safe substring list and the
    /// flags that mean "the caller chose approval behavior already".
    pub fn new(policy: &PolicySet, safe_substrings: &[String], override_flags: &[String]) -> Self {
        Self {
            deny: compile_rules(policy.deny()),
            allow: compile_rules(policy.allow()),
            safe_substrings: safe_substrings
                .iter()
                .filter(|s| !s.is_empty())
                .cloned()
                .collect(),
            override_flags: override_flags.to_vec(),
        }
    }

    /// Build an engine using the heuristic list and override flags from config.
    pub fn from_config(policy: &PolicySet, config: &Config) -> Self {
        Self::new(
            policy,
            &config.heuristic.safe_substrings,
            &config.wrapper.override_flags,
        )
    }

    fn first_deny(&self, command: &str) -> Option<&CompiledRule> {
        self.deny.iter().find(|r| r.glob.is_match(command))
    }

    fn first_allow(&self, command: &str) -> Option<&CompiledRule> {
        self.allow.iter().find(|r| r.glob.is_match(command))
    }

    /// Evaluate an argument vector. Terminal on the first decisive step:
    /// override bypass, deny rule, allow rule, safe-substring heuristic
    /// (itself deny-overridable), then default deny.
    pub fn evaluate(&self, args: &[String]) -> Ruling {
        let ctx = InvocationContext::new(args);

        if let Some(flag) = ctx.find_flag(&self.override_flags) {
            return Ruling::deny(format!("caller passed {flag}"));
        }

        if let Some(rule) = self.first_deny(&ctx.command) {
            return Ruling::deny(format!("denied by {}", rule.raw));
        }

        if let Some(rule) = self.first_allow(&ctx.command) {
            return Ruling::approve(format!("allowed by {}", rule.raw));
        }

        if let Some(hint) = self
            .safe_substrings
            .iter()
            .find(|s| ctx.command.contains(s.as_str()))
        {
            if let Some(rule) = self.first_deny(&ctx.command) {
                return Ruling::deny(format!("safe command {hint:?} but denied by {}", rule.raw));
            }
            return Ruling::approve(format!("safe command: {hint}"));
        }

        Ruling::deny("no matching rule")
    }

    /// Boolean form of [`Engine::evaluate`]: `true` means auto-approve.
    pub fn decide(&self, args: &[String]) -> bool {
        self.evaluate(args).verdict.is_approve()
    }
}
