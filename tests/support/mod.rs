#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use sublime2yas::{IdPolicy, SnippetRecord, SourceDocument, TranslationContext};
use tempfile::TempDir;

pub const SEP: &str = "---------------------";

/// Sublime snippet XML; `content: None` leaves the `<content>` element out.
pub fn snippet_xml(id: &str, key: &str, name: &str, content: Option<&str>) -> String {
    let body = content
        .map(|text| format!("    <content><![CDATA[{text}]]></content>\n"))
        .unwrap_or_default();
    format!(
        "<snippet>\n{body}    <tabTrigger>{key}</tabTrigger>\n    <scope>source.ruby</scope>\n    \
         <description>{name}</description>\n    <uuid>{id}</uuid>\n</snippet>\n"
    )
}

/// Context holding one snippet per `(id, name, content)` triple.
pub fn context_with(snippets: &[(&str, &str, Option<&str>)]) -> TranslationContext {
    let mut context = TranslationContext::new().expect("builtin table");
    for (id, name, content) in snippets {
        let path = Path::new("fixture.sublime-snippet");
        let xml = snippet_xml(id, "k", name, *content);
        let document = SourceDocument::parse(&xml, path).expect("fixture parses");
        let record =
            SnippetRecord::from_document(&document, path, IdPolicy::Require).expect("fixture record");
        context.register(record);
    }
    context
}

/// Temporary snippet tree plus an output directory named after the mode.
pub struct Workspace {
    temp: TempDir,
    pub snippets: PathBuf,
    pub output: PathBuf,
}

impl Workspace {
    pub fn new(mode: &str) -> Self {
        let temp = TempDir::new().expect("tempdir");
        let snippets = temp.path().join("Snippets");
        let output = temp.path().join("out").join(mode);
        fs::create_dir_all(&snippets).expect("snippet dir");
        fs::create_dir_all(&output).expect("output dir");
        Self {
            temp,
            snippets,
            output,
        }
    }

    pub fn write_snippet(&self, relative: &str, xml: &str) -> PathBuf {
        let path = self.snippets.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("snippet subdir");
        }
        fs::write(&path, xml).expect("write snippet");
        path
    }

    pub fn write_output(&self, relative: &str, text: &str) -> PathBuf {
        let path = self.output.join(relative);
        fs::write(&path, text).expect("write output fixture");
        path
    }

    pub fn read_output(&self, relative: &str) -> String {
        let path = self.output.join(relative);
        fs::read_to_string(&path).unwrap_or_else(|err| panic!("reading {}: {err}", path.display()))
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }
}
