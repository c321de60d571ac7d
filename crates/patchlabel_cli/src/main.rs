//! Terminal front end for reviewing and correcting patch labels.

mod review;
mod view;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use patchlabel_core::codec::normalize_patch;
use patchlabel_core::{Config, Controller};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use view::{PageBuffer, TerminalView};

#[derive(Parser)]
#[command(name = "patchlabel", about = "Review text-recognition patch labels", version)]
struct Cli {
    /// Records per page (defaults to PATCHLABEL_PAGE_SIZE or 6)
    #[arg(short = 'n', long, global = true)]
    page_size: Option<usize>,

    /// Bookmark file (defaults to PATCHLABEL_BOOKMARK or ./.bookmark)
    #[arg(long, global = true)]
    bookmark: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a dataset and remember it
    Open {
        path: PathBuf,
        /// First record of the page (keeps the remembered index when omitted)
        #[arg(short, long)]
        start: Option<u64>,
    },
    /// Print the remembered position
    Status,
    /// Print the current page
    Show {
        /// Write normalized patches of the page as PNG files into this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Move to the next page
    Next,
    /// Move to the previous page
    Prev,
    /// Move the page start to a record index
    Goto { index: u64 },
    /// Replace the label of a record
    Label { index: u64, text: String },
    /// Mark a record deleted
    Delete { index: u64 },
    /// Interactive review loop on stdin
    Review,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("patchlabel=warn,patchlabel_core=info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn resolve_config(cli: &Cli) -> Config {
    let mut config = Config::from_env();
    if let Some(page_size) = cli.page_size.filter(|size| *size > 0) {
        config.page_size = page_size;
    }
    if let Some(bookmark) = &cli.bookmark {
        config.bookmark_path = bookmark.clone();
    }
    config
}

fn restore(controller: &mut Controller) -> anyhow::Result<()> {
    if !controller
        .load_bookmark()
        .context("failed to reopen the remembered dataset")?
    {
        bail!("no dataset remembered yet; run `patchlabel open <PATH>` first");
    }
    Ok(())
}

/// Write the decoded patches of the current page as normalized PNGs.
///
/// # Returns
/// Number of files written; flagged records are skipped.
fn export_page(controller: &Controller, config: &Config, dir: &Path) -> anyhow::Result<usize> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;
    let mut written = 0;
    for record in controller.current_page(config.page_size)? {
        let Some(image) = record.image.decoded() else {
            tracing::warn!("Skipping flagged record {} during export", record.index);
            continue;
        };
        let file = dir.join(format!("{:09}.png", record.index));
        normalize_patch(image, config.patch_width, config.patch_height)
            .save(&file)
            .with_context(|| format!("failed to write {}", file.display()))?;
        written += 1;
    }
    Ok(written)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli);
    let (view, pages) = TerminalView::new(config.page_size);
    let mut controller = Controller::new(&config, Some(Box::new(view)));
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Open { path, start } => controller
            .open(&path, start)
            .with_context(|| format!("failed to open {}", path.display()))?,
        Commands::Review => {
            // A missing bookmark is fine here; `o <path>` opens from the loop.
            if let Err(err) = controller.load_bookmark() {
                eprintln!("could not reopen the remembered dataset: {}", err);
            }
            let stdin = io::stdin();
            return review::run_review(&mut controller, &pages, stdin.lock(), stdout);
        }
        command => {
            restore(&mut controller)?;
            run_oneshot(&mut controller, &config, &pages, command, &mut stdout)?;
        }
    }

    review::write_page(&mut stdout, &pages)?;
    if let Some(status) = controller.status_text() {
        writeln!(stdout, "[{}]", status)?;
    }
    Ok(())
}

fn run_oneshot<W: Write>(
    controller: &mut Controller,
    config: &Config,
    pages: &PageBuffer,
    command: Commands,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        Commands::Status => {
            // Only the status line is wanted.
            view::take_rendered(pages);
        }
        Commands::Show { export } => {
            if let Some(dir) = export {
                let written = export_page(controller, config, &dir)?;
                writeln!(out, "exported {} patches to {}", written, dir.display())?;
            }
        }
        Commands::Next => controller.next_page()?,
        Commands::Prev => controller.prev_page()?,
        Commands::Goto { index } => controller.go_to(index)?,
        Commands::Label { index, text } => {
            view::take_rendered(pages);
            controller.edit_label(index, &text)?;
            writeln!(out, "label {} set to {:?}", index, text)?;
        }
        Commands::Delete { index } => {
            view::take_rendered(pages);
            controller.mark_deleted(index)?;
            writeln!(out, "record {} marked deleted", index)?;
        }
        Commands::Open { .. } | Commands::Review => {}
    }
    Ok(())
}

fn main() {
    init_tracing();
    let exit_code = run_and_report(|| run(Cli::parse()));
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run_and_report<F>(runner: F) -> i32
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match runner() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("patchlabel: {:#}", err);
            1
        }
    }
}
