//! Content grouping by whole-file digest (hash path).
//!
//! Applied to one size group at a time, so a file is only ever hashed for
//! comparison against files of the same length. Files that cannot be read
//! get no key and drop out of the group.

use std::path::Path;

use super::groups::{group_by_key_keyed, DuplicateGroup, GroupOutcome, SizeGroup};
use crate::scanner::{HashError, Hasher};

/// Split a size group into groups of identical digest.
///
/// # Example
///
/// ```no_run
/// use dupfind::duplicates::{group_by_checksum, SizeGroup};
/// use dupfind::scanner::Hasher;
/// use std::path::PathBuf;
///
/// let group = SizeGroup::new(4, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
/// let outcome = group_by_checksum(group, &Hasher::new());
/// assert!(outcome.groups.len() <= 1);
/// ```
#[must_use]
pub fn group_by_checksum(group: SizeGroup, hasher: &Hasher) -> GroupOutcome {
    group_by_checksum_with_progress(group, hasher, &|_| {})
}

/// [`group_by_checksum`], calling `on_file` before each file is hashed.
#[must_use]
pub fn group_by_checksum_with_progress(
    group: SizeGroup,
    hasher: &Hasher,
    on_file: &(dyn Fn(&Path) + Sync),
) -> GroupOutcome {
    let size = group.size;
    let mut unreadable = 0;

    let keyed = group_by_key_keyed(group.files, |path| {
        on_file(path);
        match hasher.full_hash(path) {
            Ok(digest) => {
                log::trace!("{} {}", digest, path.display());
                Some(digest)
            }
            Err(HashError::Interrupted(_)) => None,
            Err(e @ (HashError::NotFound(_) | HashError::PermissionDenied(_))) => {
                log::debug!("Skipping unreadable file: {e}");
                unreadable += 1;
                None
            }
            Err(e) => {
                log::warn!("Failed to hash: {e}");
                unreadable += 1;
                None
            }
        }
    });

    let groups = keyed
        .into_iter()
        .map(|(digest, files)| {
            log::debug!(
                "Duplicate group {}: {} files, {} bytes each",
                digest,
                files.len(),
                size
            );
            DuplicateGroup::new(Some(digest), size, files)
        })
        .collect();

    GroupOutcome { groups, unreadable }
}
