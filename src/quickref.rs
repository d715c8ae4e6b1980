//! Markdown quick reference of the converted snippets.

pub const QUICKREF_FILE_NAME: &str = "QUICKREF.md";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuickrefEntry {
    pub key: String,
    pub name: String,
}

/// Render `QUICKREF.md`: one trigger-key/name pair per snippet, in import order.
pub fn render_quickref(mode: &str, entries: &[QuickrefEntry]) -> String {
    let mut doc = format!("# {} - Snippets Quick Reference\n", capitalize(mode));
    for entry in entries {
        doc.push_str(&format!("\n`{}` ➔ \n", entry.key));
        doc.push_str(&format!("\n>#### `{}`\n", entry.name));
    }
    doc.push_str("\n\n<sub>Generated by sublime-snippet-import</sub>\n");
    doc
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
