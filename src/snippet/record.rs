//! One Sublime snippet and its YASnippet rendering.

use super::source::SourceDocument;
use crate::directive::Category;
use crate::error::SnippetError;
use crate::substitution::{SubstitutionTable, Translation};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

pub const SNIPPET_HEADER: &str = "# -*- mode: snippet -*-\n\
# contributor: Translated to yasnippet by sublime-snippet import\n";

pub const YAS_EXTENSION: &str = "yasnippet";

const ROOT_ELEMENT: &str = "snippet";
const SCOPE_ELEMENT: &str = "scope";
const UUID_ELEMENT: &str = "uuid";

/// How to obtain an id for snippets without a `<uuid>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdPolicy {
    /// Missing `<uuid>` is malformed input.
    #[default]
    Require,
    /// Fall back to the snippet's relative path without its extension.
    DeriveFromPath,
}

#[derive(Clone, Debug, Default)]
pub struct RenderOptions {
    /// Adds `# group: <group>` to the header.
    pub group: Option<String>,
    /// Adds `# uuid: <id>` so menu entries can reference the snippet.
    pub include_uuid: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnippetRecord {
    id: String,
    name: String,
    key: String,
    raw_condition: Option<String>,
    raw_binding: Option<String>,
    raw_content: Option<String>,
    path: PathBuf,
}

impl SnippetRecord {
    /// Build a record from a parsed document.
    ///
    /// `path` is the snippet's path relative to the snippet directory; it
    /// labels errors and backs [`IdPolicy::DeriveFromPath`].
    pub fn from_document(
        document: &SourceDocument,
        path: &Path,
        policy: IdPolicy,
    ) -> Result<Self, SnippetError> {
        if document.root() != ROOT_ELEMENT {
            return Err(SnippetError::NotASnippet {
                path: path.to_path_buf(),
                reason: "root element is not <snippet>",
            });
        }
        if document.field(SCOPE_ELEMENT).is_none() {
            return Err(SnippetError::NotASnippet {
                path: path.to_path_buf(),
                reason: "no <scope> element",
            });
        }

        let id = match (document.trimmed_field(UUID_ELEMENT), policy) {
            (Some(uuid), _) => uuid.to_string(),
            (None, IdPolicy::DeriveFromPath) => path_id(path),
            (None, IdPolicy::Require) => {
                return Err(SnippetError::MissingField {
                    path: path.to_path_buf(),
                    field: UUID_ELEMENT,
                });
            }
        };

        let raw = |category: Category| {
            category
                .source_element()
                .and_then(|element| document.field(element))
                .map(str::to_string)
        };

        Ok(Self {
            id,
            name: document.trimmed_field("description").unwrap_or_default().to_string(),
            key: document.trimmed_field("tabTrigger").unwrap_or_default().to_string(),
            raw_condition: raw(Category::Condition),
            raw_binding: raw(Category::Binding),
            raw_content: raw(Category::Content),
            path: path.to_path_buf(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tab trigger; empty when the snippet has none.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn raw_content(&self) -> Option<&str> {
        self.raw_content.as_deref()
    }

    fn raw(&self, category: Category) -> Option<&str> {
        match category {
            Category::Content => self.raw_content.as_deref(),
            Category::Condition => self.raw_condition.as_deref(),
            Category::Binding => self.raw_binding.as_deref(),
            Category::Type => None,
        }
    }

    pub fn condition(&self, table: &mut SubstitutionTable) -> Translation {
        table.translate_directive(Category::Condition, self.raw(Category::Condition), &self.id)
    }

    pub fn binding(&self, table: &mut SubstitutionTable) -> Translation {
        table.translate_directive(Category::Binding, self.raw(Category::Binding), &self.id)
    }

    pub fn snippet_type(&self, table: &mut SubstitutionTable) -> Translation {
        table.translate_directive(Category::Type, self.raw(Category::Type), &self.id)
    }

    pub fn content(&self, table: &mut SubstitutionTable) -> String {
        table.translate_content(self.raw(Category::Content), &self.id)
    }

    /// Full `.yasnippet` file text.
    pub fn render(&self, table: &mut SubstitutionTable, options: &RenderOptions) -> String {
        let mut doc = String::from(SNIPPET_HEADER);
        doc.push_str(&self.snippet_type(table).directive_line(Category::Type));
        if options.include_uuid {
            doc.push_str(&format!("# uuid: {}\n", self.id));
        }
        if !self.key.is_empty() {
            doc.push_str(&format!("# key: {}\n", self.key));
        }
        if let Some(group) = &options.group {
            doc.push_str(&format!("# group: {group}\n"));
        }
        doc.push_str(&format!("# name: {}\n", self.name));
        doc.push_str(&self.binding(table).directive_line(Category::Binding));
        doc.push_str(&self.condition(table).directive_line(Category::Condition));
        doc.push_str("# --\n");
        doc.push_str(&self.content(table));
        doc
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn path_id(path: &Path) -> String {
    slash_path(&path.with_extension(""))
}

static INVALID_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[^ a-z_0-9.+=~(){}/'`&#,-]").expect("valid file name class"));
static REPEATED_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(" {2,}").expect("valid space run"));

/// Output path (relative) for a snippet read from `relative`.
///
/// Drops the extension and any characters YASnippet users would not want in a
/// file name, squeezes runs of spaces and trims trailing whitespace.
pub fn yas_file_name(relative: &Path) -> PathBuf {
    let stem = slash_path(&relative.with_extension(""));
    let cleaned = INVALID_FILE_CHARS.replace_all(&stem, "");
    let squeezed = REPEATED_SPACES.replace_all(&cleaned, " ");
    PathBuf::from(format!("{}.{YAS_EXTENSION}", squeezed.trim_end()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(xml: &str) -> SourceDocument {
        SourceDocument::parse(xml, Path::new("fixture.sublime-snippet")).unwrap()
    }

    fn record(xml: &str) -> SnippetRecord {
        SnippetRecord::from_document(
            &document(xml),
            Path::new("py/def.sublime-snippet"),
            IdPolicy::Require,
        )
        .unwrap()
    }

    #[test]
    fn renders_header_in_directive_order() {
        let snippet = record(
            "<snippet><content>print(${1})</content><tabTrigger>p</tabTrigger>\
             <scope>text.plain</scope><description>Print</description><uuid>U1</uuid>\
             <keyEquivalent>^p</keyEquivalent></snippet>",
        );
        let mut table = SubstitutionTable::new().unwrap();
        table.install_override(Category::Binding, "^p", "C-c p").unwrap();
        table.install_override(Category::Type, "U1", "command").unwrap();
        let options = RenderOptions {
            group: Some("io".into()),
            include_uuid: true,
        };
        assert_eq!(
            snippet.render(&mut table, &options),
            "# -*- mode: snippet -*-\n\
             # contributor: Translated to yasnippet by sublime-snippet import\n\
             # type: command\n\
             # uuid: U1\n\
             # key: p\n\
             # group: io\n\
             # name: Print\n\
             # binding: C-c p\n\
             ## condition: \"text.plain\"\n\
             # --\n\
             print($1)"
        );
    }

    #[test]
    fn absent_directives_contribute_nothing() {
        let snippet = record(
            "<snippet><scope>source.python</scope><description>Empty</description>\
             <uuid>U2</uuid></snippet>",
        );
        let mut table = SubstitutionTable::new().unwrap();
        assert_eq!(
            snippet.render(&mut table, &RenderOptions::default()),
            format!("{SNIPPET_HEADER}# name: Empty\n# --\n(yas-unimplemented)")
        );
        assert!(table.is_unimplemented("U2"));
    }

    #[test]
    fn missing_scope_is_skippable() {
        let err = SnippetRecord::from_document(
            &document("<snippet><uuid>U3</uuid></snippet>"),
            Path::new("x.sublime-snippet"),
            IdPolicy::Require,
        )
        .unwrap_err();
        assert!(err.is_skippable());

        let err = SnippetRecord::from_document(
            &document("<plist><scope>x</scope></plist>"),
            Path::new("x.sublime-snippet"),
            IdPolicy::Require,
        )
        .unwrap_err();
        assert!(err.is_skippable());
    }

    #[test]
    fn missing_uuid_is_malformed_unless_derived() {
        let doc = document("<snippet><scope>source.c</scope></snippet>");
        let err =
            SnippetRecord::from_document(&doc, Path::new("c/for.sublime-snippet"), IdPolicy::Require)
                .unwrap_err();
        assert!(matches!(err, SnippetError::MissingField { field: "uuid", .. }));

        let derived = SnippetRecord::from_document(
            &doc,
            Path::new("c/for.sublime-snippet"),
            IdPolicy::DeriveFromPath,
        )
        .unwrap();
        assert_eq!(derived.id(), "c/for");
    }

    #[test]
    fn file_names_are_canonicalized() {
        assert_eq!(
            yas_file_name(Path::new("rails/Link to  (named) *.sublime-snippet")),
            PathBuf::from("rails/Link to (named).yasnippet")
        );
        assert_eq!(
            yas_file_name(Path::new("def.sublime-snippet")),
            PathBuf::from("def.yasnippet")
        );
    }
}
