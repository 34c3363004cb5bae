//! Output formatters for duplicate groups.
//!
//! - [`json`]: a JSON array with one group per line (default)
//! - [`text`]: one path per line, groups separated by a blank line
//!
//! Nothing is written when there are no groups; an empty report is the
//! signal that the tree holds no duplicates.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::cli::OutputFormat;
//! use dupfind::duplicates::DuplicateFinder;
//! use dupfind::output::write_groups;
//! use std::path::Path;
//!
//! let (groups, _) = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("."))
//!     .unwrap();
//! write_groups(&mut std::io::stdout().lock(), &groups, OutputFormat::Json).unwrap();
//! ```

pub mod json;
pub mod text;

use std::io::Write;

pub use json::JsonOutput;
pub use text::TextOutput;

use crate::cli::OutputFormat;
use crate::duplicates::DuplicateGroup;

/// Errors that can occur while writing results.
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Write `groups` in the chosen format. Writes nothing if `groups` is empty.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_groups<W: Write>(
    writer: &mut W,
    groups: &[DuplicateGroup],
    format: OutputFormat,
) -> Result<(), OutputError> {
    if groups.is_empty() {
        return Ok(());
    }
    match format {
        OutputFormat::Json => JsonOutput::new(groups).write_to(writer)?,
        OutputFormat::Text => TextOutput::new(groups).write_to(writer)?,
    }
    writer.flush()?;
    Ok(())
}

/// The trailing runtime line, seconds rounded to five decimals.
///
/// ```
/// use dupfind::output::runtime_line;
/// use std::time::Duration;
///
/// assert_eq!(runtime_line(Duration::from_millis(1500)), "Runtime: 1.5s");
/// ```
#[must_use]
pub fn runtime_line(elapsed: std::time::Duration) -> String {
    let secs = (elapsed.as_secs_f64() * 100_000.0).round() / 100_000.0;
    format!("Runtime: {secs}s")
}
