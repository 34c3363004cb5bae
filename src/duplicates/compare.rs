//! Content grouping by direct byte comparison (fast path).
//!
//! No digests are computed. A size group is treated as a worklist: the first
//! remaining file becomes a seed, every other remaining file is compared
//! against it chunk by chunk, and matches leave the worklist with the seed.
//! Files that did not match wait for the next seed.
//!
//! Any I/O failure makes a pair compare unequal, so a file that vanishes or
//! loses read permission mid-run simply ends up in no group.

use std::fs::{self, File};
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::groups::{DuplicateGroup, GroupOutcome, SizeGroup};
use crate::scanner::{DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};

/// Fill `buf` from `reader`, stopping early only at end of file.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Compare two readers chunk by chunk.
///
/// Returns `false` at the first differing chunk, `true` only when both
/// readers reach end of file together.
///
/// # Errors
///
/// Propagates read errors from either side.
pub fn readers_equal<A: Read, B: Read>(mut a: A, mut b: B, buffer_size: usize) -> io::Result<bool> {
    let buffer_size = buffer_size.clamp(1, MAX_BUFFER_SIZE);
    let mut buf_a = vec![0u8; buffer_size];
    let mut buf_b = vec![0u8; buffer_size];

    loop {
        let n_a = read_full(&mut a, &mut buf_a)?;
        let n_b = read_full(&mut b, &mut buf_b)?;

        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// Compare the content of two files.
///
/// # Errors
///
/// Returns an error if either file cannot be opened or read.
pub fn files_equal(a: &Path, b: &Path, buffer_size: usize) -> io::Result<bool> {
    let file_a = File::open(a)?;
    let file_b = File::open(b)?;
    readers_equal(file_a, file_b, buffer_size)
}

/// Whether two paths are non-empty regular files with identical content.
///
/// Never fails: errors count as "not duplicates".
#[must_use]
pub fn are_duplicates(a: &Path, b: &Path, buffer_size: usize) -> bool {
    let (meta_a, meta_b) = match (fs::symlink_metadata(a), fs::symlink_metadata(b)) {
        (Ok(meta_a), Ok(meta_b)) => (meta_a, meta_b),
        (Err(e), _) | (_, Err(e)) => {
            log::debug!("Cannot compare {} and {}: {}", a.display(), b.display(), e);
            return false;
        }
    };

    if !meta_a.is_file() || !meta_b.is_file() || meta_a.len() == 0 || meta_a.len() != meta_b.len() {
        return false;
    }

    match files_equal(a, b, buffer_size) {
        Ok(equal) => equal,
        Err(e) => {
            log::debug!("Cannot compare {} and {}: {}", a.display(), b.display(), e);
            false
        }
    }
}

/// Pairwise comparator for the fast path.
#[derive(Debug, Clone)]
pub struct Comparator {
    buffer_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new()
    }
}

impl Comparator {
    /// Comparator with 8 KiB chunks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            shutdown_flag: None,
        }
    }

    /// Set the comparison chunk size (clamped to `1..=MAX_BUFFER_SIZE`).
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.clamp(1, MAX_BUFFER_SIZE);
        self
    }

    /// Stop consuming the worklist once the flag is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Split a size group into groups of identical content.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dupfind::duplicates::{Comparator, SizeGroup};
    /// use std::path::PathBuf;
    ///
    /// let group = SizeGroup::new(4, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
    /// let outcome = Comparator::new().group_by_comparison(group);
    /// ```
    #[must_use]
    pub fn group_by_comparison(&self, group: SizeGroup) -> GroupOutcome {
        self.group_by_comparison_with_progress(group, &|_| {})
    }

    /// [`Comparator::group_by_comparison`], calling `on_file` once per file
    /// as it is taken off the worklist.
    #[must_use]
    pub fn group_by_comparison_with_progress(
        &self,
        group: SizeGroup,
        on_file: &(dyn Fn(&Path) + Sync),
    ) -> GroupOutcome {
        let size = group.size;
        let mut worklist: Vec<PathBuf> = group.files;
        let mut outcome = GroupOutcome::default();

        while !worklist.is_empty() {
            if self.is_shutdown_requested() {
                log::debug!("Shutdown requested, abandoning {} candidates", worklist.len());
                break;
            }

            let seed = worklist.remove(0);
            on_file(&seed);

            // A seed nobody can read matches nothing; skip the comparisons
            if let Err(e) = File::open(&seed) {
                log::debug!("Skipping unreadable file {}: {}", seed.display(), e);
                outcome.unreadable += 1;
                continue;
            }

            let mut members = vec![seed];
            let mut i = 0;
            while i < worklist.len() {
                if are_duplicates(&members[0], &worklist[i], self.buffer_size) {
                    let matched = worklist.remove(i);
                    on_file(&matched);
                    members.push(matched);
                } else {
                    i += 1;
                }
            }

            if members.len() >= 2 {
                log::debug!(
                    "Duplicate group: {} files, {} bytes each",
                    members.len(),
                    size
                );
                outcome.groups.push(DuplicateGroup::new(None, size, members));
            }
        }

        outcome
    }
}
