//! YASnippet menu generation from a TextMate-style menu description.

pub mod node;
pub mod render;

pub use node::{MAIN_MENU_NAME, MenuModel, MenuNode, SEPARATOR_MARKER, is_separator};
pub use render::{
    Bracket, DEFINE_MENU, MenuRenderer, RenderedMenu, SEPARATOR, SUBMENU, exclusion_clause,
    render_menu,
};
