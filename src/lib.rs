//! Convert Sublime Text snippets into YASnippet snippets.
//!
//! [`import::run_import`] drives a whole directory: every snippet is parsed
//! into a [`SnippetRecord`], its fields are rewritten through the
//! [`SubstitutionTable`] and the result is written as a YASnippet file. An
//! optional TextMate-style menu model is rendered into a `yas-define-menu`
//! expression inside `.yas-setup.el`.

pub mod context;
pub mod directive;
pub mod error;
pub mod import;
pub mod menu;
pub mod quickref;
pub mod setup;
pub mod snippet;
pub mod substitution;

pub use context::TranslationContext;
pub use directive::{Category, PerCategory};
pub use error::{SnippetError, TableError};
pub use import::{ImportOptions, ImportSummary, run_import};
pub use menu::{MenuModel, MenuNode, RenderedMenu, render_menu};
pub use setup::SetupFile;
pub use snippet::{IdPolicy, RenderOptions, SnippetRecord, SourceDocument};
pub use substitution::{Pattern, Replacement, Rule, SubstitutionTable, Translation};

/// Split a comma or whitespace separated list, dropping empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
