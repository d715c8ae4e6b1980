//! `yas-define-menu` rendering.
//!
//! The renderer walks the menu tree and prints nested Lisp lists. Nested
//! lists are aligned under the token that opened them, so indentation is a
//! running column count (caller indent plus the width of whatever was written
//! before the opening bracket), not a nesting depth.
//!
//! Separators only appear between real items of the same list: one is printed
//! when a translated snippet has been emitted since the list started or since
//! the previous separator. Ignored (unimplemented) snippets, submenus and
//! deleted or dangling ids never earn a separator.

use super::node::{MenuModel, MenuNode, is_separator};
use crate::context::TranslationContext;
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

pub const DEFINE_MENU: &str = "(yas-define-menu ";
pub const SUBMENU: &str = "(yas-submenu ";
pub const SEPARATOR: &str = "(yas-separator)";

const EXCLUDED_OPEN_INDENT: usize = 20;
const EXCLUDED_ITEM_INDENT: usize = 23;

/// Opening token of a list and the text that closes the enclosing expression.
#[derive(Clone, Copy, Debug)]
pub struct Bracket<'a> {
    pub open: &'a str,
    pub close: &'a str,
}

impl Default for Bracket<'_> {
    fn default() -> Self {
        Self {
            open: "(",
            close: ")",
        }
    }
}

/// Rendered menu plus what was left out of it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedMenu {
    pub text: String,
    /// Ids skipped because they are in the deleted set, in encounter order.
    pub deleted: Vec<String>,
    /// Ids that resolved to neither a submenu, a snippet nor a separator.
    pub dangling: Vec<String>,
}

pub struct MenuRenderer<'a> {
    submenus: &'a IndexMap<String, MenuNode>,
    deleted_ids: &'a IndexSet<String>,
    context: &'a TranslationContext,
    active: Vec<String>,
    deleted: Vec<String>,
    dangling: Vec<String>,
}

impl<'a> MenuRenderer<'a> {
    pub fn new(
        submenus: &'a IndexMap<String, MenuNode>,
        deleted_ids: &'a IndexSet<String>,
        context: &'a TranslationContext,
    ) -> Self {
        Self {
            submenus,
            deleted_ids,
            context,
            active: Vec::new(),
            deleted: Vec::new(),
            dangling: Vec::new(),
        }
    }

    /// Render one node's item list starting at column `indent`.
    pub fn render_node(&mut self, node: &MenuNode, indent: usize, bracket: Bracket<'_>) -> String {
        let item_indent = indent + bracket.open.len();
        let mut out = String::new();
        let mut first = true;
        let mut separator_useless = true;

        for id in &node.items {
            if self.deleted_ids.contains(id) {
                warn!(id = %id, "menu item has been deleted");
                self.deleted.push(id.clone());
                continue;
            }

            let entry = if let Some(submenu) = self.submenu(id) {
                self.active.push(id.clone());
                let nested = self.render_node(
                    submenu,
                    item_indent + SUBMENU.len(),
                    Bracket::default(),
                );
                self.active.pop();
                format!("{SUBMENU}\"{}\"{nested}", submenu.name)
            } else if let Some(snippet) = self.context.snippet(id) {
                let pad = " ".repeat(item_indent);
                if self.context.is_unimplemented(id) {
                    separator_useless = true;
                    format!(
                        ";; Ignoring {}\n{pad}(yas-ignore-item \"{id}\")",
                        snippet.name()
                    )
                } else {
                    separator_useless = false;
                    format!(";; {}\n{pad}(yas-item \"{id}\")", snippet.name())
                }
            } else if is_separator(id) {
                if separator_useless {
                    continue;
                }
                separator_useless = true;
                SEPARATOR.to_string()
            } else {
                debug!(id = %id, "dropping menu reference to unknown id");
                self.dangling.push(id.clone());
                continue;
            };

            out.push('\n');
            out.push_str(&" ".repeat(indent));
            if first {
                out.push_str(bracket.open);
            } else {
                out.push_str(&" ".repeat(bracket.open.len()));
            }
            out.push_str(&entry);
            first = false;
        }

        if first {
            out.push(' ');
            out.push_str(bracket.open);
        }
        out.push(')');
        out.push_str(bracket.close);
        out
    }

    /// Submenu for `id`, unless it is already being rendered further up.
    fn submenu(&self, id: &str) -> Option<&'a MenuNode> {
        if self.active.iter().any(|active| active == id) {
            warn!(id = %id, "submenu contains itself; dropping the nested reference");
            return None;
        }
        self.submenus.get(id)
    }

    pub fn finish(self, text: String) -> RenderedMenu {
        RenderedMenu {
            text,
            deleted: self.deleted,
            dangling: self.dangling,
        }
    }
}

/// Closing clause: the quoted excluded ids as a second list.
pub fn exclusion_clause<'i>(excluded: impl IntoIterator<Item = &'i str>) -> String {
    let quoted: Vec<String> = excluded
        .into_iter()
        .map(|id| format!("\"{id}\""))
        .collect();
    let separator = format!("\n{}", " ".repeat(EXCLUDED_ITEM_INDENT));
    format!(
        "\n{}'({}))",
        " ".repeat(EXCLUDED_OPEN_INDENT),
        quoted.join(&separator)
    )
}

/// Render the whole `(yas-define-menu ...)` expression for `mode`.
///
/// The exclusion clause lists the model's declared exclusions followed by
/// every snippet whose content could not be translated.
pub fn render_menu(model: &MenuModel, mode: &str, context: &TranslationContext) -> RenderedMenu {
    let mut excluded: IndexSet<&str> = model.excluded.iter().map(String::as_str).collect();
    excluded.extend(context.substitutions.unimplemented());
    let closing = exclusion_clause(excluded);

    let mut renderer = MenuRenderer::new(&model.submenus, &model.deleted, context);
    let body = renderer.render_node(
        &model.root,
        DEFINE_MENU.len(),
        Bracket {
            open: "'(",
            close: &closing,
        },
    );
    renderer.finish(format!("{DEFINE_MENU}'{mode}{body}"))
}
