//! Grouping primitives and group types.
//!
//! # Overview
//!
//! Every grouping stage in dupfind is an instance of one routine,
//! [`group_by_key`]: walk the candidates once, compute a key per candidate,
//! drop candidates without a key, and keep only buckets with two or more
//! members. Size grouping keys on byte length (zero excluded), checksum
//! grouping keys on the content digest.
//!
//! Ordering is deterministic: buckets appear in the order their key was
//! first seen, and members keep candidate order.
//!
//! # Example
//!
//! ```
//! use dupfind::duplicates::group_by_key;
//!
//! let words = vec!["apple", "bob", "avocado", "bee", "cherry"];
//! let groups = group_by_key(words, |w| w.chars().next());
//!
//! assert_eq!(groups, vec![vec!["apple", "avocado"], vec!["bob", "bee"]]);
//! ```

use std::collections::HashMap;
use std::fs;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use crate::scanner::ContentHash;

/// Group items by key, returning each surviving bucket with its key.
///
/// `key` is called exactly once per item. Items for which it returns `None`
/// are dropped. Buckets with fewer than two members are discarded.
pub fn group_by_key_keyed<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Vec<(K, Vec<T>)>
where
    K: Eq + Hash + Clone,
    F: FnMut(&T) -> Option<K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut buckets: Vec<(K, Vec<T>)> = Vec::new();

    for item in items {
        let Some(k) = key(&item) else {
            continue;
        };
        match index.get(&k) {
            Some(&slot) => buckets[slot].1.push(item),
            None => {
                index.insert(k.clone(), buckets.len());
                buckets.push((k, vec![item]));
            }
        }
    }

    buckets.retain(|(_, members)| members.len() >= 2);
    buckets
}

/// Group items by key.
///
/// Same as [`group_by_key_keyed`] without the keys.
pub fn group_by_key<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<Vec<T>>
where
    K: Eq + Hash + Clone,
    F: FnMut(&T) -> Option<K>,
{
    group_by_key_keyed(items, key)
        .into_iter()
        .map(|(_, members)| members)
        .collect()
}

/// Files sharing one non-zero byte length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeGroup {
    /// Length in bytes shared by every file
    pub size: u64,
    pub files: Vec<PathBuf>,
}

impl SizeGroup {
    #[must_use]
    pub fn new(size: u64, files: Vec<PathBuf>) -> Self {
        Self { size, files }
    }
}

/// Confirmed group of files with identical content.
///
/// Always holds at least two paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Content digest, present when found on the hash path
    pub hash: Option<ContentHash>,
    pub size: u64,
    pub files: Vec<PathBuf>,
}

impl DuplicateGroup {
    #[must_use]
    pub fn new(hash: Option<ContentHash>, size: u64, files: Vec<PathBuf>) -> Self {
        debug_assert!(files.len() >= 2, "duplicate group needs two or more files");
        Self { hash, size, files }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of copies beyond the first.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Bytes freed by keeping only one copy.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }
}

/// Result of running a content stage over one size group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupOutcome {
    pub groups: Vec<DuplicateGroup>,
    /// Files dropped because they could not be read
    pub unreadable: usize,
}

/// Statistics from size grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Candidates given to the grouper
    pub total_files: usize,
    /// Sum of the sizes of every statable file
    pub total_size: u64,
    pub empty_files: usize,
    /// Candidates whose metadata could not be read
    pub unreadable_files: usize,
    /// Distinct non-zero sizes seen
    pub unique_sizes: usize,
    /// Files dropped because no other file shares their size
    pub eliminated_unique: usize,
    /// Files left in size groups
    pub potential_duplicates: usize,
    pub size_groups: usize,
}

impl GroupingStats {
    /// Percentage of candidates removed by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            let eliminated = self.total_files - self.potential_duplicates;
            (eliminated as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Current length of a regular file, without following symlinks.
///
/// `None` for symlinks, non-files, and files that can no longer be statted.
fn regular_file_len(path: &Path) -> Result<Option<u64>, std::io::Error> {
    let metadata = fs::symlink_metadata(path)?;
    Ok(metadata.is_file().then_some(metadata.len()))
}

/// Partition candidates by byte length.
///
/// Zero-length files and files that cannot be statted are dropped; only
/// sizes shared by two or more files survive.
///
/// # Example
///
/// ```no_run
/// use dupfind::duplicates::group_by_size;
/// use std::path::PathBuf;
///
/// let (groups, stats) = group_by_size(vec![PathBuf::from("/a"), PathBuf::from("/b")]);
/// println!("{} size groups from {} files", groups.len(), stats.total_files);
/// ```
#[must_use]
pub fn group_by_size(paths: impl IntoIterator<Item = PathBuf>) -> (Vec<SizeGroup>, GroupingStats) {
    let mut stats = GroupingStats::default();
    let mut sizes_seen: HashMap<u64, usize> = HashMap::new();

    let keyed = group_by_key_keyed(paths, |path| {
        stats.total_files += 1;
        match regular_file_len(path) {
            Ok(Some(0)) => {
                stats.empty_files += 1;
                log::trace!("Skipping empty file: {}", path.display());
                None
            }
            Ok(Some(len)) => {
                stats.total_size += len;
                *sizes_seen.entry(len).or_default() += 1;
                Some(len)
            }
            Ok(None) => {
                log::debug!("No longer a regular file: {}", path.display());
                stats.unreadable_files += 1;
                None
            }
            Err(e) => {
                log::warn!("Cannot read metadata for {}: {}", path.display(), e);
                stats.unreadable_files += 1;
                None
            }
        }
    });

    stats.unique_sizes = sizes_seen.len();
    stats.eliminated_unique = sizes_seen.values().filter(|&&count| count == 1).count();

    let groups: Vec<SizeGroup> = keyed
        .into_iter()
        .map(|(size, files)| {
            log::debug!("Size group {} bytes: {} candidates", size, files.len());
            SizeGroup::new(size, files)
        })
        .collect();

    stats.size_groups = groups.len();
    stats.potential_duplicates = groups.iter().map(|g| g.files.len()).sum();

    (groups, stats)
}
