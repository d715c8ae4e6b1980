//! Parsed `.sublime-snippet` documents.
//!
//! A Sublime snippet is a flat XML document: a `<snippet>` root whose children
//! (`content`, `tabTrigger`, `scope`, `description`, ...) each hold one text
//! value, usually CDATA for the body. The reader keeps exactly that shape: the
//! root element name plus the text of every top-level child, in document order.

use crate::error::SnippetError;
use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceDocument {
    root: String,
    fields: IndexMap<String, String>,
}

impl SourceDocument {
    /// Read and parse a snippet file from disk.
    pub fn read(path: &Path) -> Result<Self, SnippetError> {
        let xml = fs::read_to_string(path).map_err(|source| SnippetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&xml, path)
    }

    /// Parse snippet XML; `path` only labels errors.
    pub fn parse(xml: &str, path: &Path) -> Result<Self, SnippetError> {
        let mut reader = Reader::from_str(xml);
        let mut document = SourceDocument::default();
        let mut depth = 0usize;
        let mut current: Option<String> = None;

        loop {
            let event = reader.read_event().map_err(|source| SnippetError::Xml {
                path: path.to_path_buf(),
                position: reader.error_position() as u64,
                source,
            })?;
            match event {
                Event::Start(start) => {
                    depth += 1;
                    let name = element_name(start.name().as_ref());
                    match depth {
                        1 => document.root = name,
                        2 => {
                            document.fields.insert(name.clone(), String::new());
                            current = Some(name);
                        }
                        _ => {}
                    }
                }
                Event::Empty(empty) => {
                    let name = element_name(empty.name().as_ref());
                    match depth {
                        0 => document.root = name,
                        1 => {
                            document.fields.insert(name, String::new());
                        }
                        _ => {}
                    }
                }
                Event::End(_) => {
                    if depth == 2 {
                        current = None;
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Text(text) => {
                    if let Some(field) = current.as_ref() {
                        let unescaped = text.unescape().map_err(|err| SnippetError::Xml {
                            path: path.to_path_buf(),
                            position: reader.buffer_position() as u64,
                            source: quick_xml::Error::from(err),
                        })?;
                        document.push_text(field, &unescaped);
                    }
                }
                Event::CData(cdata) => {
                    if let Some(field) = current.as_ref() {
                        document.push_text(field, &String::from_utf8_lossy(&cdata));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(document)
    }

    fn push_text(&mut self, field: &str, text: &str) {
        if let Some(value) = self.fields.get_mut(field) {
            value.push_str(text);
        }
    }

    /// Name of the root element (`snippet` for Sublime snippets).
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Raw text of a top-level child element, if the element is present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Trimmed text of a top-level child element; `None` when absent or blank.
    pub fn trimmed_field(&self, name: &str) -> Option<&str> {
        self.field(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNIPPET: &str = r#"<snippet>
    <content><![CDATA[def ${1:name}(${2}):
    ${0:pass}]]></content>
    <tabTrigger>def</tabTrigger>
    <scope>source.python</scope>
    <description>Function &amp; body</description>
    <uuid/>
</snippet>"#;

    #[test]
    fn parses_cdata_and_escaped_text() {
        let doc = SourceDocument::parse(SNIPPET, Path::new("def.sublime-snippet")).unwrap();
        assert_eq!(doc.root(), "snippet");
        assert_eq!(
            doc.field("content"),
            Some("def ${1:name}(${2}):\n    ${0:pass}")
        );
        assert_eq!(doc.field("tabTrigger"), Some("def"));
        assert_eq!(doc.field("description"), Some("Function & body"));
        assert_eq!(doc.field("uuid"), Some(""));
        assert_eq!(doc.trimmed_field("uuid"), None);
        assert_eq!(doc.field("keyEquivalent"), None);
    }

    #[test]
    fn malformed_xml_reports_the_path() {
        let err = SourceDocument::parse("<snippet><content></snippet>", Path::new("bad.sublime-snippet"))
            .unwrap_err();
        assert!(!err.is_skippable());
        assert!(err.to_string().starts_with("bad.sublime-snippet"));
    }
}
