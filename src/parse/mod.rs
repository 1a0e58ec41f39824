pub mod glob;
pub mod rule;

pub use glob::{Glob, matches};
pub use rule::ParsedRule;
