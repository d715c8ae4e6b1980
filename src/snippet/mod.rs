//! Sublime snippet documents and their YASnippet form.

pub mod record;
pub mod source;

pub use record::{IdPolicy, RenderOptions, SNIPPET_HEADER, SnippetRecord, yas_file_name};
pub use source::SourceDocument;
