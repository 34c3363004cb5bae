//! Plain text output: one path per line, a blank line between groups.
//!
//! Paths are printed with `Path::display`, so this format is for people and
//! simple shell loops rather than exact round-tripping.

use std::io::{self, Write};

use crate::duplicates::DuplicateGroup;

/// Text view of a list of duplicate groups.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
}

impl<'a> TextOutput<'a> {
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self { groups }
    }

    /// Write every group to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                writeln!(writer)?;
            }
            for path in &group.files {
                writeln!(writer, "{}", path.display())?;
            }
        }
        Ok(())
    }

    /// Render to a string.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
