//! Command-line interface definitions for dupfind.
//!
//! Flat argument list parsed with the clap derive API. Options that also
//! exist in the configuration file are `Option`s here so that an absent flag
//! does not override a configured value (see [`crate::config`]).
//!
//! # Example
//!
//! ```bash
//! # Hash path (default)
//! dupfind -p ~/Downloads
//!
//! # Fast path: pairwise byte comparison, no hashing
//! dupfind -p ~/Downloads --fast
//!
//! # Plain text, 64 KiB chunks, no runtime line
//! dupfind -p ~/Downloads -o text --buffer-size 64KiB --no-runtime
//! ```

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scanner::{HashAlgorithm, MAX_BUFFER_SIZE};

/// Find groups of files with identical content.
///
/// Files are first grouped by size; only files sharing a size are hashed
/// (or, with --fast, compared byte by byte). Groups are printed as JSON.
#[derive(Debug, Parser)]
#[command(name = "dupfind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan for duplicates
    #[arg(short, long, value_name = "PATH")]
    pub path: PathBuf,

    /// Compare files pairwise instead of hashing them
    #[arg(short, long)]
    pub fast: bool,

    /// Digest used on the hash path
    #[arg(long, value_enum, value_name = "ALGORITHM")]
    pub hash: Option<HashAlgorithm>,

    /// Chunk size for reading and comparing files (e.g. 8KiB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_buffer_size)]
    pub buffer_size: Option<usize>,

    /// Number of worker threads processing size groups
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub io_threads: Option<u16>,

    /// Maximum directory depth to descend (1 = only the root's entries)
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Do not print the runtime line after the results
    #[arg(long)]
    pub no_runtime: bool,

    /// Configuration file (TOML)
    ///
    /// Defaults to config.toml in the platform configuration directory.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print results and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

/// Output format for duplicate groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON array with one group per line
    #[default]
    Json,
    /// One path per line, groups separated by a blank line
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupfind::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("8KiB").unwrap(), 8192);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}

/// Parse a chunk size: a non-zero [`parse_size`] value no larger than
/// [`MAX_BUFFER_SIZE`].
///
/// # Errors
///
/// Returns an error for unparsable, zero, or oversized values.
pub fn parse_buffer_size(s: &str) -> Result<usize, String> {
    let bytes = parse_size(s)?;
    if bytes == 0 {
        return Err("Buffer size must be greater than zero".to_string());
    }
    match usize::try_from(bytes) {
        Ok(size) if size <= MAX_BUFFER_SIZE => Ok(size),
        _ => Err(format!(
            "Buffer size too large: {bytes} bytes (maximum {MAX_BUFFER_SIZE})"
        )),
    }
}
