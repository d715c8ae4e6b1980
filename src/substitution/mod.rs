//! Text substitution between the Sublime and YASnippet snippet dialects.

pub mod builtin;
pub mod rule;
pub mod table;

pub use rule::{ComputeFn, Pattern, Replacement, Rule};
pub use table::{Applied, SubstitutionTable, Translation, UNIMPLEMENTED, UNKNOWN_MARKER};
