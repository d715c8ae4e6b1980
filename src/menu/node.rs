//! Menu description input.
//!
//! The menu model is a JSON document shaped like a TextMate bundle's
//! `info.plist` menu section:
//!
//! ```json
//! {
//!   "mainMenu": {
//!     "items": ["SUBMENU-ID", "---------------------", "SNIPPET-ID"],
//!     "submenus": { "SUBMENU-ID": { "name": "Loops", "items": ["SNIPPET-ID"] } },
//!     "excludedItems": ["OTHER-ID"]
//!   },
//!   "deleted": ["STALE-ID"]
//! }
//! ```

use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Items containing this run of dashes are separators.
pub const SEPARATOR_MARKER: &str = "---------------------";

/// Name given to the root node.
pub const MAIN_MENU_NAME: &str = "__main_menu__";

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct MenuNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<String>,
}

impl MenuNode {
    pub fn new(name: impl Into<String>, items: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

pub fn is_separator(id: &str) -> bool {
    id.contains(SEPARATOR_MARKER)
}

#[derive(Debug, Deserialize)]
struct RawMainMenu {
    items: Vec<String>,
    #[serde(default)]
    submenus: IndexMap<String, MenuNode>,
    #[serde(default, rename = "excludedItems")]
    excluded_items: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawMenuModel {
    #[serde(rename = "mainMenu")]
    main_menu: RawMainMenu,
    #[serde(default)]
    deleted: Vec<String>,
}

/// Root menu, its submenus and the deleted/excluded id sets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MenuModel {
    pub root: MenuNode,
    pub submenus: IndexMap<String, MenuNode>,
    pub deleted: IndexSet<String>,
    pub excluded: IndexSet<String>,
}

impl MenuModel {
    pub fn new(root_items: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            root: MenuNode::new(MAIN_MENU_NAME, root_items),
            ..Self::default()
        }
    }

    pub fn with_submenu(mut self, id: impl Into<String>, node: MenuNode) -> Self {
        self.submenus.insert(id.into(), node);
        self
    }

    pub fn with_deleted(mut self, id: impl Into<String>) -> Self {
        self.deleted.insert(id.into());
        self
    }

    pub fn with_excluded(mut self, id: impl Into<String>) -> Self {
        self.excluded.insert(id.into());
        self
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawMenuModel = serde_json::from_str(text).context("parsing menu model")?;
        Ok(Self {
            root: MenuNode {
                name: MAIN_MENU_NAME.to_string(),
                items: raw.main_menu.items,
            },
            submenus: raw.main_menu.submenus,
            deleted: raw.deleted.into_iter().collect(),
            excluded: raw.main_menu.excluded_items.into_iter().collect(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading menu model {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("loading menu model {}", path.display()))
    }
}
