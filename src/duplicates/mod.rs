//! Duplicate detection.
//!
//! This module provides:
//! - Generic key grouping and size grouping ([`groups`])
//! - Content grouping by digest, the hash path ([`checksum`])
//! - Content grouping by pairwise byte comparison, the fast path ([`compare`])
//! - The pipeline tying scan and grouping stages together ([`finder`])

pub mod checksum;
pub mod compare;
pub mod finder;
pub mod groups;

pub use checksum::{group_by_checksum, group_by_checksum_with_progress};
pub use compare::{are_duplicates, files_equal, readers_equal, Comparator};
pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary, Strategy};
pub use groups::{
    group_by_key, group_by_key_keyed, group_by_size, DuplicateGroup, GroupOutcome, GroupingStats,
    SizeGroup,
};
