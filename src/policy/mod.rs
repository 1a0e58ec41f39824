//! Policy store: allow/deny rule lists merged from ranked sources.

pub mod source;

pub use source::{Source, SourceDescriptor, SourceError, load_sources};

use std::collections::HashSet;

/// The merged allow and deny rules for one invocation, in precedence order.
///
/// Neither list contains a raw rule string twice. Rules are kept in raw form;
/// the decision engine parses them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicySet {
    allow: Vec<String>,
    deny: Vec<String>,
}

impl PolicySet {
    /// Merge sources given highest precedence first.
    ///
    /// Sources are folded from lowest to highest precedence, each one's lists
    /// prepended to the accumulator, so higher-precedence rules come first.
    /// Duplicates are then dropped, keeping the earliest position.
    pub fn build(sources: &[Source]) -> Self {
        let mut allow: Vec<String> = Vec::new();
        let mut deny: Vec<String> = Vec::new();

        for source in sources.iter().rev() {
            allow = prepend(&source.allow, allow);
            deny = prepend(&source.deny, deny);
        }

        let policy = Self {
            allow: dedup_stable(allow),
            deny: dedup_stable(deny),
        };
        log::debug!(
            "policy: {} allow, {} deny after merging {} source(s)",
            policy.allow.len(),
            policy.deny.len(),
            sources.len()
        );
        policy
    }

    /// Load the described sources from disk and merge them.
    pub fn load(descriptors: &[SourceDescriptor]) -> Self {
        Self::build(&load_sources(descriptors))
    }

    /// Build directly from rule lists (single anonymous source).
    pub fn from_rules<S: AsRef<str>>(allow: &[S], deny: &[S]) -> Self {
        Self::build(&[Source {
            name: "inline".into(),
            allow: allow.iter().map(|s| s.as_ref().to_string()).collect(),
            deny: deny.iter().map(|s| s.as_ref().to_string()).collect(),
        }])
    }

    pub fn allow(&self) -> &[String] {
        &self.allow
    }

    pub fn deny(&self) -> &[String] {
        &self.deny
    }

    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }
}

fn prepend(front: &[String], back: Vec<String>) -> Vec<String> {
    let mut merged = Vec::with_capacity(front.len() + back.len());
    merged.extend_from_slice(front);
    merged.extend(back);
    merged
}

/// Drop repeated entries, keeping the first occurrence in place.
fn dedup_stable(list: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    list.into_iter()
        .filter(|rule| seen.insert(rule.clone()))
        .collect()
}
