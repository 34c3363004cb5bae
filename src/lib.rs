//! dupfind - Duplicate File Finder
//!
//! Finds groups of files with identical content under a directory tree.
//! Files are first partitioned by size, then each size group is resolved
//! either by hashing every file (BLAKE3 by default) or, in fast mode, by
//! comparing files against each other chunk by chunk.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod generator;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::path_utils::resolve_root;
use crate::scanner::WalkerConfig;

/// Run the application for a parsed command line, printing to stdout.
///
/// # Errors
///
/// Returns an error for invalid configuration, a missing root, an
/// interrupted scan, or a failure to write the results.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_output(&cli, &mut out)
}

/// Run the application, writing duplicate groups to `out`.
///
/// The runtime line and progress bars go to stderr so that `out` only ever
/// holds the report.
///
/// # Errors
///
/// Same as [`run_app`].
pub fn run_with_output<W: Write>(cli: &Cli, out: &mut W) -> Result<ExitCode> {
    let start = Instant::now();

    let config = Config::load(cli)?;
    log::debug!("Effective configuration: {config:?}");

    let root = resolve_root(&cli.path)
        .with_context(|| format!("Failed to resolve path {}", cli.path.display()))?;

    let handler = signal::install_handler().context("Failed to set up Ctrl+C handling")?;
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(cli.quiet));

    let finder_config = FinderConfig::default()
        .with_fast(config.fast)
        .with_hash_algorithm(config.hash)
        .with_buffer_size(config.buffer_size)
        .with_io_threads(config.io_threads)
        .with_walker_config(WalkerConfig::default().with_max_depth(config.max_depth))
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress);

    let (groups, summary) = DuplicateFinder::new(finder_config).find_duplicates(&root)?;

    log::info!(
        "{} files scanned ({}), {} eliminated by size, {} by content, {} unreadable",
        summary.total_files,
        summary.total_size_display(),
        summary.eliminated_by_size,
        summary.eliminated_by_content,
        summary.unreadable_files
    );
    if summary.scan_errors > 0 {
        log::warn!(
            "{} directory entries could not be read and were skipped",
            summary.scan_errors
        );
    }

    output::write_groups(out, &groups, config.output).context("Failed to write results")?;

    if !cli.quiet && !cli.no_runtime {
        eprintln!("\n{}", output::runtime_line(start.elapsed()));
    }

    Ok(ExitCode::Success)
}
