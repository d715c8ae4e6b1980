//! Import a directory of Sublime Text snippets into a YASnippet mode directory.
//!
//! Usage:
//!   sublime-snippet-import -d Snippets/ -o snippets/rails-mode -p ruby-mode
//!   sublime-snippet-import -d Snippets/ -o snippets/rails-mode --menu menu.json --doc

use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;
use sublime2yas::import::DEFAULT_GLOB;
use sublime2yas::{IdPolicy, ImportOptions, run_import};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sublime-snippet-import")]
#[command(about = "Convert Sublime Text snippets into YASnippet snippets")]
struct Cli {
    /// Directory holding the Sublime snippets.
    #[arg(short = 'd', long)]
    snippet_dir: PathBuf,
    /// YASnippet mode directory to write into.
    #[arg(short = 'o', long)]
    output_dir: PathBuf,
    /// Major mode name; defaults to the output directory's name.
    #[arg(short = 'm', long)]
    major_mode: Option<String>,
    /// Parent modes written to .yas-parents (comma or space separated).
    #[arg(short = 'p', long)]
    parent_modes: Option<String>,
    /// File name glob searched in every directory below --snippet-dir.
    #[arg(short = 'g', long, default_value = DEFAULT_GLOB)]
    glob: String,
    /// Group added to every generated snippet.
    #[arg(short = 'G', long)]
    snippet_group: Option<String>,
    /// Menu model (JSON) rendered into .yas-setup.el.
    #[arg(long)]
    menu: Option<PathBuf>,
    /// Use the relative file path as id for snippets without a uuid.
    #[arg(long)]
    derive_ids: bool,
    /// Also write a QUICKREF.md listing keys and names.
    #[arg(long)]
    doc: bool,
    /// Only report warnings and errors.
    #[arg(short = 'q', long)]
    quiet: bool,
}

impl Cli {
    fn into_options(self) -> ImportOptions {
        let mut options = ImportOptions::new(self.snippet_dir, self.output_dir);
        options.major_mode = self.major_mode;
        options.parent_modes = self.parent_modes;
        options.glob = self.glob;
        options.snippet_group = self.snippet_group;
        options.menu = self.menu;
        options.quickref = self.doc;
        if self.derive_ids {
            options.id_policy = IdPolicy::DeriveFromPath;
        }
        options
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let summary = run_import(&cli.into_options())?;
    tracing::info!(
        mode = %summary.mode,
        converted = summary.converted.len(),
        skipped = summary.skipped.len(),
        failed = summary.failed.len(),
        "import finished"
    );
    if let Some(menu) = &summary.menu {
        if !menu.deleted.is_empty() {
            tracing::warn!(count = menu.deleted.len(), "deleted menu items left out");
        }
    }

    if !summary.failed.is_empty() {
        let paths: Vec<String> = summary
            .failed
            .iter()
            .map(|issue| issue.path.display().to_string())
            .collect();
        bail!(
            "{} snippet(s) could not be converted: {}",
            summary.failed.len(),
            paths.join(", ")
        );
    }
    Ok(())
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
