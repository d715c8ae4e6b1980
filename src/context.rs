//! Per-run translation state.
//!
//! A `TranslationContext` owns everything a conversion run accumulates: the
//! snippet index keyed by id and the substitution table with its collectors.
//! Snippets register here as they are parsed; the menu renderer reads the
//! same context afterwards, so every snippet must be registered before a menu
//! is rendered.

use crate::error::TableError;
use crate::snippet::{RenderOptions, SnippetRecord};
use crate::substitution::SubstitutionTable;
use indexmap::IndexMap;
use tracing::warn;

#[derive(Debug)]
pub struct TranslationContext {
    pub substitutions: SubstitutionTable,
    snippets: IndexMap<String, SnippetRecord>,
}

impl TranslationContext {
    /// Context with the shipped substitution rules.
    pub fn new() -> Result<Self, TableError> {
        Ok(Self::with_table(SubstitutionTable::new()?))
    }

    pub fn with_table(substitutions: SubstitutionTable) -> Self {
        Self {
            substitutions,
            snippets: IndexMap::new(),
        }
    }

    /// Add a snippet to the index.
    ///
    /// The content is translated once here so the collectors already know
    /// about unimplemented snippets when the menu renders. A later snippet
    /// with the same id replaces the earlier one, along with whatever the
    /// earlier content left in the unimplemented set.
    pub fn register(&mut self, record: SnippetRecord) -> &SnippetRecord {
        let id = record.id().to_string();
        if self.snippets.contains_key(&id) {
            self.substitutions.forget_content(&id);
        }
        record.content(&mut self.substitutions);
        if let Some(previous) = self.snippets.insert(id.clone(), record) {
            warn!(
                id = %id,
                previous = %previous.path().display(),
                "duplicate snippet id; replacing earlier registration"
            );
        }
        &self.snippets[&id]
    }

    pub fn snippet(&self, id: &str) -> Option<&SnippetRecord> {
        self.snippets.get(id)
    }

    pub fn snippets(&self) -> impl Iterator<Item = &SnippetRecord> {
        self.snippets.values()
    }

    pub fn len(&self) -> usize {
        self.snippets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    /// Render a registered snippet as `.yasnippet` text.
    pub fn render_snippet(&mut self, id: &str, options: &RenderOptions) -> Option<String> {
        let record = self.snippets.get(id)?;
        Some(record.render(&mut self.substitutions, options))
    }

    /// True when the id names a snippet whose content could not be translated.
    pub fn is_unimplemented(&self, id: &str) -> bool {
        self.substitutions.is_unimplemented(id)
    }
}
