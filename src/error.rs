//! Error types for snippet parsing and substitution tables.

use std::path::PathBuf;
use thiserror::Error;

/// Per-file failures. The importer reports these and moves on to the next file.
#[derive(Debug, Error)]
pub enum SnippetError {
    /// The document parsed but is not a `<snippet>` with a `<scope>`.
    #[error("{path}: not a sublime-snippet ({reason})")]
    NotASnippet { path: PathBuf, reason: &'static str },

    /// A required element is missing from an otherwise valid snippet.
    #[error("{path}: missing <{field}> element")]
    MissingField { path: PathBuf, field: &'static str },

    /// The document is not well-formed XML.
    #[error("{path}: XML parse error at byte {position}")]
    Xml {
        path: PathBuf,
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("{path}: read failed")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SnippetError {
    /// Skippable errors mean "not our kind of file"; everything else is malformed input.
    pub fn is_skippable(&self) -> bool {
        matches!(self, SnippetError::NotASnippet { .. })
    }
}

/// Structural problems with the substitution rule tables. These halt a run.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("invalid substitution pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown substitution category '{0}'")]
    UnknownCategory(String),

    #[error("empty substitution pattern for category '{0}'")]
    EmptyPattern(String),
}
