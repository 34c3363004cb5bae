//! JSON output formatter.
//!
//! The document is a single array of groups, each group an array of path
//! strings. Every group sits on its own line so that the output stays
//! readable and line-oriented tools can still pick groups apart:
//!
//! ```text
//! [["/data/a.txt","/data/copy/a.txt"],
//! ["/data/b.bin","/data/old/b.bin","/data/tmp/b.bin"]]
//! ```
//!
//! Non-UTF-8 path bytes are replaced with U+FFFD.

use std::io::Write;

use super::OutputError;
use crate::duplicates::DuplicateGroup;

/// JSON view of a list of duplicate groups.
#[derive(Debug, Clone, Copy)]
pub struct JsonOutput<'a> {
    groups: &'a [DuplicateGroup],
}

impl<'a> JsonOutput<'a> {
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self { groups }
    }

    /// Serialize to the line-per-group JSON layout.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    ///
    /// # Example
    ///
    /// ```
    /// use dupfind::duplicates::DuplicateGroup;
    /// use dupfind::output::JsonOutput;
    /// use std::path::PathBuf;
    ///
    /// let groups = vec![DuplicateGroup::new(
    ///     None,
    ///     3,
    ///     vec![PathBuf::from("/a"), PathBuf::from("/b")],
    /// )];
    /// let json = JsonOutput::new(&groups).to_json().unwrap();
    /// assert_eq!(json, r#"[["/a","/b"]]"#);
    /// ```
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let lines = self
            .groups
            .iter()
            .map(|group| serde_json::to_string(&path_strings(group)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("[{}]", lines.join(",\n")))
    }

    /// Write the JSON document followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), OutputError> {
        let json = self.to_json()?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

fn path_strings(group: &DuplicateGroup) -> Vec<String> {
    group
        .files
        .iter()
        .map(|path| path.to_string_lossy().into_owned())
        .collect()
}
