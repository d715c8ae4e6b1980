//! Directive categories.
//!
//! Every translatable snippet attribute belongs to one category, and each
//! category owns its own substitution layers. The category names double as the
//! YASnippet directive names (`# condition: ...`) and as the section names in
//! the `.yas-setup.el` override file, so parsing and printing go through this
//! module instead of hard-coding strings.

use crate::error::TableError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Content,
    Condition,
    Binding,
    Type,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Content,
        Category::Condition,
        Category::Binding,
        Category::Type,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Content => "content",
            Category::Condition => "condition",
            Category::Binding => "binding",
            Category::Type => "type",
        }
    }

    /// Element of the `.sublime-snippet` document that feeds this category.
    ///
    /// `type` has no Sublime counterpart; it can only be produced by an
    /// id-keyed override.
    pub fn source_element(&self) -> Option<&'static str> {
        match self {
            Category::Content => Some("content"),
            Category::Condition => Some("scope"),
            Category::Binding => Some("keyEquivalent"),
            Category::Type => None,
        }
    }
}

impl TryFrom<&str> for Category {
    type Error = TableError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "content" => Ok(Category::Content),
            "condition" => Ok(Category::Condition),
            "binding" => Ok(Category::Binding),
            "type" => Ok(Category::Type),
            other => Err(TableError::UnknownCategory(other.to_string())),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per category.
#[derive(Clone, Debug, Default)]
pub struct PerCategory<T> {
    content: T,
    condition: T,
    binding: T,
    kind: T,
}

impl<T> PerCategory<T> {
    pub fn get(&self, category: Category) -> &T {
        match category {
            Category::Content => &self.content,
            Category::Condition => &self.condition,
            Category::Binding => &self.binding,
            Category::Type => &self.kind,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut T {
        match category {
            Category::Content => &mut self.content,
            Category::Condition => &mut self.condition,
            Category::Binding => &mut self.binding,
            Category::Type => &mut self.kind,
        }
    }
}
