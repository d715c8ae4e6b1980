//! `.yas-setup.el` handling.
//!
//! The file is split by a `;; --**--` line. The head belongs to the user: it
//! carries substitution overrides in commented-out form,
//!
//! ```text
//! ;; Substitutions for: content
//! ;; ${TM_FILENAME} =yyas> `(buffer-name)`
//! ```
//!
//! and the importer appends every value it could not translate there with
//! `(yas-unknown)` as the replacement, so the user only has to edit the right
//! hand side. Entries still pointing at `(yas-unknown)` are not installed.
//! Everything after the separator is regenerated on every run.

use crate::directive::Category;
use crate::error::TableError;
use crate::substitution::{SubstitutionTable, UNKNOWN_MARKER};
use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

pub const SETUP_FILE_NAME: &str = ".yas-setup.el";
pub const SETUP_SEPARATOR: &str = ";; --**--";

const GENERATED_BANNER: &str = ";; Automatically generated code, do not edit this part\n";

static SECTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^;; Substitutions for:(.*)$").expect("valid section pattern"));
static OVERRIDE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^;;(.*)[ ]+=yyas>(.*)$").expect("valid override pattern"));

/// One `pattern =yyas> replacement` line from the head.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Override {
    pub category: Category,
    pub pattern: String,
    pub replacement: String,
}

impl Override {
    pub fn is_placeholder(&self) -> bool {
        self.replacement.contains(UNKNOWN_MARKER)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupFile {
    head: String,
    tail: String,
}

impl SetupFile {
    /// Fresh head for a mode without a setup file.
    pub fn new(mode: &str) -> Self {
        Self {
            head: format!(";; {SETUP_FILE_NAME} for {mode}\n;; \n"),
            tail: String::new(),
        }
    }

    pub fn parse(text: &str) -> Self {
        match text.split_once(SETUP_SEPARATOR) {
            Some((head, tail)) => Self {
                head: head.to_string(),
                tail: tail.to_string(),
            },
            None => Self {
                head: text.to_string(),
                tail: String::new(),
            },
        }
    }

    /// Load the setup file, or start a new one when it does not exist yet.
    pub fn load(path: &Path, mode: &str) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new(mode));
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading setup file {}", path.display()))?;
        Ok(Self::parse(&text))
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    /// Previously generated section; replaced by [`SetupFile::render`].
    pub fn tail(&self) -> &str {
        &self.tail
    }

    /// Every override line in the head, placeholders included.
    ///
    /// Lines before the first section header are ignored. A section naming an
    /// unknown category is only an error once it holds a real override.
    pub fn overrides(&self) -> Result<Vec<Override>, TableError> {
        let mut section: Option<Result<Category, String>> = None;
        let mut found = Vec::new();
        for line in self.head.lines() {
            if let Some(caps) = SECTION_LINE.captures(line) {
                let name = caps[1].trim();
                section = Some(Category::try_from(name).map_err(|_| name.to_string()));
                continue;
            }
            let Some(caps) = OVERRIDE_LINE.captures(line) else {
                continue;
            };
            let pattern = caps[1].trim_matches(' ').to_string();
            let replacement = caps[2].trim().to_string();
            match &section {
                None => continue,
                Some(Ok(category)) => found.push(Override {
                    category: *category,
                    pattern,
                    replacement,
                }),
                Some(Err(name)) => {
                    if !replacement.contains(UNKNOWN_MARKER) {
                        return Err(TableError::UnknownCategory(name.clone()));
                    }
                }
            }
        }
        Ok(found)
    }

    /// Install the head's overrides; returns how many became rules.
    pub fn install(&self, table: &mut SubstitutionTable) -> Result<usize, TableError> {
        let mut installed = 0;
        for entry in self.overrides()? {
            if table.install_override(entry.category, &entry.pattern, &entry.replacement)? {
                installed += 1;
            }
        }
        Ok(installed)
    }

    /// Append placeholder lines for unknown values the head does not list yet.
    ///
    /// Override lines hold a single-line literal, so values spanning lines are
    /// left out. Returns the number of lines added.
    pub fn merge_unknowns(&mut self, table: &SubstitutionTable) -> Result<usize, TableError> {
        let listed: BTreeSet<(Category, String)> = self
            .overrides()?
            .into_iter()
            .map(|entry| (entry.category, entry.pattern))
            .collect();

        let mut added = 0;
        for category in Category::ALL {
            let fresh: Vec<(String, &str)> = table
                .unknown(category)
                .iter()
                .filter(|(value, _)| {
                    if value.contains('\n') {
                        debug!(%category, value = %value, "multi-line value not listed in setup file");
                        return false;
                    }
                    !listed.contains(&(category, value.to_string()))
                })
                .map(|(value, owner)| (value.clone(), owner.as_str()))
                .collect();
            if fresh.is_empty() {
                continue;
            }
            if !self.head.is_empty() && !self.head.ends_with('\n') {
                self.head.push('\n');
            }
            self.head
                .push_str(&format!(";; Substitutions for: {category}\n;; \n"));
            for (value, owner) in fresh {
                self.head.push_str(&format!(
                    ";; # as in {owner}\n;; {value} =yyas> ({UNKNOWN_MARKER})\n"
                ));
                added += 1;
            }
            self.head.push_str(";; \n");
        }
        Ok(added)
    }

    /// Full file text: the head, the separator and a freshly generated section.
    pub fn render(&self, generated: &str) -> String {
        let mut text = self.head.clone();
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(SETUP_SEPARATOR);
        text.push('\n');
        text.push_str(GENERATED_BANNER);
        if !generated.is_empty() {
            text.push_str(";;\n");
            text.push_str(generated);
            if !generated.ends_with('\n') {
                text.push('\n');
            }
        }
        text
    }
}
