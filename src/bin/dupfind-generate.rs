//! dupfind-generate - Random duplicate file tree generator
//!
//! Creates a tree of random files, a share of which are byte-for-byte
//! copies of earlier ones, and prints `[[path, size], ...]` as JSON.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use dupfind::cli::parse_size;
use dupfind::error::{ExitCode, StructuredError};
use dupfind::generator::{generate_files, GeneratorConfig};
use dupfind::logging::init_logging;

/// Generate random files with a given ratio of duplicates.
#[derive(Debug, Parser)]
#[command(name = "dupfind-generate")]
#[command(author, version, about, long_about = None)]
struct GenerateCli {
    /// Number of files to generate
    #[arg(short = 'n', long, value_name = "N")]
    file_count: usize,

    /// Directory to generate files in
    #[arg(short, long, value_name = "PATH", default_value = ".")]
    path: PathBuf,

    /// Maximum number of sub-directories between the root and a file
    #[arg(long, value_name = "N", default_value_t = 8)]
    directory_max_depth: usize,

    /// Minimum number of sub-directories (depth is fixed at the maximum if unset)
    #[arg(long, value_name = "N")]
    directory_min_depth: Option<usize>,

    /// Fraction of generated files that are copies of earlier files
    #[arg(long, value_name = "RATIO", default_value_t = 0.2)]
    duplicate_ratio: f64,

    /// Comma-separated extensions to pick from (e.g. jpg,mp3,txt)
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    file_extensions: Vec<String>,

    /// Minimum length of a random extension
    #[arg(long, value_name = "N", default_value_t = 3)]
    file_extension_min_length: usize,

    /// Maximum length of a random extension (0 disables extensions)
    #[arg(long, value_name = "N", default_value_t = 3)]
    file_extension_max_length: usize,

    /// Minimum length of a file name
    #[arg(long, value_name = "N", default_value_t = 1)]
    file_name_min_length: usize,

    /// Maximum length of a file name
    #[arg(long, value_name = "N", default_value_t = 8)]
    file_name_max_length: usize,

    /// Minimum file size (e.g. 1KiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size, default_value = "1KiB")]
    file_min_size: u64,

    /// Maximum file size (e.g. 1GiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size, default_value = "1GiB")]
    file_max_size: u64,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print the file list and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long)]
    json_errors: bool,
}

impl From<&GenerateCli> for GeneratorConfig {
    fn from(cli: &GenerateCli) -> Self {
        GeneratorConfig::new(&cli.path, cli.file_count)
            .with_depth_range(cli.directory_min_depth, cli.directory_max_depth)
            .with_duplicate_ratio(cli.duplicate_ratio)
            .with_extensions(cli.file_extensions.clone())
            .with_extension_length(cli.file_extension_min_length, cli.file_extension_max_length)
            .with_name_length(cli.file_name_min_length, cli.file_name_max_length)
            .with_size_range(cli.file_min_size, cli.file_max_size)
    }
}

fn run(cli: &GenerateCli) -> anyhow::Result<()> {
    let config = GeneratorConfig::from(cli);
    let files = generate_files(&config)
        .with_context(|| format!("Failed to generate files under {}", cli.path.display()))?;

    let listing: Vec<(String, u64)> = files
        .into_iter()
        .map(|f| (f.path.to_string_lossy().into_owned(), f.size))
        .collect();
    println!("{}", serde_json::to_string(&listing)?);
    Ok(())
}

fn main() {
    let cli = GenerateCli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(err) = run(&cli) {
        let exit_code = ExitCode::GeneralError;
        if cli.json_errors {
            let structured = StructuredError::new(&err, exit_code);
            match serde_json::to_string_pretty(&structured) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("[{}] Error: {err:#}", exit_code.code_prefix()),
            }
        } else {
            eprintln!("[{}] Error: {err:#}", exit_code.code_prefix());
        }
        std::process::exit(exit_code.as_i32());
    }
}
