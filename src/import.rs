//! Directory-level import: discovers Sublime snippets, converts each one and
//! writes the YASnippet tree.
//!
//! Per-file problems never stop the batch: files that are not snippets are
//! skipped, malformed ones are reported in [`ImportSummary::failed`], and the
//! remaining files are still converted. Only setup problems (missing
//! directories, a broken override table, an unreadable menu model) abort the
//! run, and they do so before any snippet is written.

use crate::context::TranslationContext;
use crate::error::SnippetError;
use crate::menu::{MenuModel, RenderedMenu, render_menu};
use crate::quickref::{QUICKREF_FILE_NAME, QuickrefEntry, render_quickref};
use crate::setup::{SETUP_FILE_NAME, SetupFile};
use crate::snippet::{IdPolicy, RenderOptions, SnippetRecord, SourceDocument, yas_file_name};
use crate::split_list;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info};

pub const DEFAULT_GLOB: &str = "*.sublime-snippet";
pub const PARENTS_FILE_NAME: &str = ".yas-parents";
const FALLBACK_MODE: &str = "major-mode-name";

#[derive(Clone, Debug)]
pub struct ImportOptions {
    pub snippet_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Defaults to the output directory's name.
    pub major_mode: Option<String>,
    /// Comma or whitespace separated; written to `.yas-parents`.
    pub parent_modes: Option<String>,
    /// File name glob, matched in every directory below `snippet_dir`.
    pub glob: String,
    pub snippet_group: Option<String>,
    /// Menu model JSON; when set the menu is rendered into `.yas-setup.el`.
    pub menu: Option<PathBuf>,
    pub id_policy: IdPolicy,
    /// Write `QUICKREF.md` into the output directory.
    pub quickref: bool,
}

impl ImportOptions {
    pub fn new(snippet_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            snippet_dir: snippet_dir.into(),
            output_dir: output_dir.into(),
            major_mode: None,
            parent_modes: None,
            glob: DEFAULT_GLOB.to_string(),
            snippet_group: None,
            menu: None,
            id_policy: IdPolicy::Require,
            quickref: false,
        }
    }

    pub fn mode_name(&self) -> String {
        self.major_mode
            .clone()
            .or_else(|| {
                self.output_dir
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| FALLBACK_MODE.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertedSnippet {
    pub id: String,
    pub key: String,
    pub name: String,
    /// Source path relative to the snippet directory.
    pub source: PathBuf,
    pub output: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileIssue {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub mode: String,
    pub converted: Vec<ConvertedSnippet>,
    pub skipped: Vec<FileIssue>,
    pub failed: Vec<FileIssue>,
    pub menu: Option<RenderedMenu>,
    /// Unknown values newly listed in `.yas-setup.el`.
    pub unknown_listed: usize,
}

pub fn run_import(options: &ImportOptions) -> Result<ImportSummary> {
    ensure_dir(&options.snippet_dir, "snippet directory")?;
    ensure_dir(&options.output_dir, "output directory")?;
    let mode = options.mode_name();

    if let Some(parents) = &options.parent_modes {
        write_parents(&options.output_dir, parents)?;
    }

    let setup_path = options.output_dir.join(SETUP_FILE_NAME);
    let mut setup = SetupFile::load(&setup_path, &mode)?;
    let mut context = TranslationContext::new().context("building builtin substitution table")?;
    let installed = setup
        .install(&mut context.substitutions)
        .with_context(|| format!("installing overrides from {}", setup_path.display()))?;
    debug!(installed, "installed substitution overrides");

    let menu_model = options
        .menu
        .as_deref()
        .map(MenuModel::load)
        .transpose()?;
    let render_options = RenderOptions {
        group: options.snippet_group.clone(),
        include_uuid: menu_model.is_some(),
    };

    let files = discover(&options.snippet_dir, &options.glob)?;
    info!(count = files.len(), "attempting to convert snippets");

    let mut summary = ImportSummary {
        mode: mode.clone(),
        ..ImportSummary::default()
    };
    for relative in files {
        let shown = options.snippet_dir.join(&relative);
        match convert_one(&mut context, options, &relative, &render_options) {
            Ok(converted) => {
                info!(path = %shown.display(), output = %converted.output.display(), "converted");
                summary.converted.push(converted);
            }
            Err(err) => {
                let issue = FileIssue {
                    path: relative,
                    message: format!("{err:#}"),
                };
                let skippable = err
                    .downcast_ref::<SnippetError>()
                    .is_some_and(SnippetError::is_skippable);
                if skippable {
                    info!(path = %shown.display(), reason = %issue.message, "skipped");
                    summary.skipped.push(issue);
                } else {
                    error!(path = %shown.display(), error = %issue.message, "failed");
                    summary.failed.push(issue);
                }
            }
        }
    }

    summary.menu = menu_model.map(|model| render_menu(&model, &mode, &context));
    if let Some(menu) = &summary.menu {
        if !menu.dangling.is_empty() {
            debug!(dangling = ?menu.dangling, "menu references without a target");
        }
    }

    summary.unknown_listed = setup
        .merge_unknowns(&context.substitutions)
        .with_context(|| format!("updating {}", setup_path.display()))?;
    let generated = summary
        .menu
        .as_ref()
        .map(|menu| menu.text.clone())
        .unwrap_or_default();
    fs::write(&setup_path, setup.render(&generated))
        .with_context(|| format!("writing {}", setup_path.display()))?;

    if options.quickref {
        let entries: Vec<QuickrefEntry> = summary
            .converted
            .iter()
            .map(|snippet| QuickrefEntry {
                key: snippet.key.clone(),
                name: snippet.name.clone(),
            })
            .collect();
        let path = options.output_dir.join(QUICKREF_FILE_NAME);
        fs::write(&path, render_quickref(&mode, &entries))
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "quick reference created");
    }

    Ok(summary)
}

fn convert_one(
    context: &mut TranslationContext,
    options: &ImportOptions,
    relative: &Path,
    render_options: &RenderOptions,
) -> Result<ConvertedSnippet> {
    let document = SourceDocument::read(&options.snippet_dir.join(relative))?;
    let record = SnippetRecord::from_document(&document, relative, options.id_policy)?;
    let text = record.render(&mut context.substitutions, render_options);

    let output = options.output_dir.join(yas_file_name(relative));
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    fs::write(&output, text).with_context(|| format!("writing {}", output.display()))?;

    let converted = ConvertedSnippet {
        id: record.id().to_string(),
        key: record.key().to_string(),
        name: record.name().to_string(),
        source: relative.to_path_buf(),
        output,
    };
    context.register(record);
    Ok(converted)
}

/// Snippet files below `snippet_dir`, relative to it, in sorted order.
pub fn discover(snippet_dir: &Path, file_glob: &str) -> Result<Vec<PathBuf>> {
    // glob reports `./a/b` as `a/b`; match the prefix in that form
    let root = without_cur_dir(snippet_dir);
    let pattern = if root.as_os_str().is_empty() {
        format!("**/{file_glob}")
    } else {
        format!("{}/**/{file_glob}", glob::Pattern::escape(&root.to_string_lossy()))
    };
    let mut files = Vec::new();
    for entry in glob::glob(&pattern).with_context(|| format!("invalid glob '{file_glob}'"))? {
        let path = entry.context("reading snippet directory")?;
        if !path.is_file() {
            continue;
        }
        let relative = without_cur_dir(&path)
            .strip_prefix(&root)
            .map(Path::to_path_buf)
            .with_context(|| {
                format!(
                    "{} is not below snippet directory {}",
                    path.display(),
                    snippet_dir.display()
                )
            })?;
        files.push(relative);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn without_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

fn write_parents(output_dir: &Path, parents: &str) -> Result<()> {
    let path = output_dir.join(PARENTS_FILE_NAME);
    let modes = split_list(parents);
    fs::write(&path, format!("{}\n", modes.join(" ")))
        .with_context(|| format!("writing {}", path.display()))
}

fn ensure_dir(path: &Path, label: &str) -> Result<()> {
    if !path.is_dir() {
        bail!("{label} {} must exist", path.display());
    }
    Ok(())
}
