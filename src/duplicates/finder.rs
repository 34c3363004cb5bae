//! Duplicate finder: the detection pipeline.
//!
//! # Overview
//!
//! A run moves through three stages and never revisits one:
//! 1. **Scan**: walk the root once, collecting regular files in sorted order
//! 2. **Size grouping**: keep only files whose length is shared (see
//!    [`crate::duplicates::groups`])
//! 3. **Content grouping**: per size group, either hash every file
//!    ([`Strategy::Checksum`]) or compare files pairwise
//!    ([`Strategy::Compare`])
//!
//! Size groups are independent, so stage 3 runs them on a bounded rayon
//! pool. Results are collected in size-group order, which keeps output
//! identical from run to run on an unchanged tree.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::duplicates::{DuplicateFinder, FinderConfig, Strategy};
//! use std::path::Path;
//!
//! let config = FinderConfig::default()
//!     .with_strategy(Strategy::Compare)
//!     .with_io_threads(2);
//! let (groups, summary) = DuplicateFinder::new(config)
//!     .find_duplicates(Path::new("/data"))
//!     .unwrap();
//!
//! for group in &groups {
//!     println!("{:?}", group.files);
//! }
//! println!("{} reclaimable", summary.reclaimable_display());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::checksum::group_by_checksum_with_progress;
use super::compare::Comparator;
use super::groups::{group_by_size, DuplicateGroup, GroupOutcome};
use crate::progress::{ProgressCallback, PHASE_CONTENT, PHASE_SCAN};
use crate::scanner::{
    HashAlgorithm, Hasher, ScanError, Walker, WalkerConfig, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE,
};

/// How same-size files are checked for identical content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Whole-file digest per file, grouped by digest.
    #[default]
    Checksum,
    /// Chunked byte comparison against a seed file, no hashing.
    Compare,
}

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    pub strategy: Strategy,
    /// Digest used by [`Strategy::Checksum`].
    pub hash_algorithm: HashAlgorithm,
    /// Chunk size for hashing and comparison.
    pub buffer_size: usize,
    /// Worker threads processing size groups. Default is 4.
    pub io_threads: usize,
    pub walker_config: WalkerConfig,
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("strategy", &self.strategy)
            .field("hash_algorithm", &self.hash_algorithm)
            .field("buffer_size", &self.buffer_size)
            .field("io_threads", &self.io_threads)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            hash_algorithm: HashAlgorithm::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            io_threads: 4,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Shorthand for choosing [`Strategy::Compare`] when `fast` is true.
    #[must_use]
    pub fn with_fast(self, fast: bool) -> Self {
        self.with_strategy(if fast { Strategy::Compare } else { Strategy::Checksum })
    }

    #[must_use]
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Set the chunk size (clamped to `1..=MAX_BUFFER_SIZE`).
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.clamp(1, MAX_BUFFER_SIZE);
        self
    }

    /// Set the worker count (clamped to at least one thread).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSummary {
    /// Regular files found by the walker
    pub total_files: usize,
    /// Combined size of every statable file
    pub total_size: u64,
    /// Zero-length files, never grouped
    pub empty_files: usize,
    /// Files dropped because their size is unique
    pub eliminated_by_size: usize,
    /// Same-size files whose content matched no other file
    pub eliminated_by_content: usize,
    /// Files that could not be statted, hashed or opened
    pub unreadable_files: usize,
    /// Directory entries the walker could not read
    pub scan_errors: usize,
    pub duplicate_groups: usize,
    /// Copies beyond the first in each group
    pub duplicate_files: usize,
    /// Bytes freed by keeping one file per group
    pub reclaimable_space: u64,
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Percentage of scanned bytes taken up by redundant copies.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The scan root does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The scan root exists but cannot be inspected.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The worker pool could not be started.
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Duplicate finder that runs the detection pipeline.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
    comparator: Comparator,
}

impl DuplicateFinder {
    /// Create a finder from a configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new()
            .with_algorithm(config.hash_algorithm)
            .with_buffer_size(config.buffer_size);
        let mut comparator = Comparator::new().with_buffer_size(config.buffer_size);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(Arc::clone(flag));
            comparator = comparator.with_shutdown_flag(Arc::clone(flag));
        }
        Self {
            config,
            hasher,
            comparator,
        }
    }

    /// Create a finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find all groups of identical files under `root`.
    ///
    /// Groups come out in size-group encounter order; paths inside a group
    /// keep traversal order. An empty `Vec` means no duplicates.
    ///
    /// # Errors
    ///
    /// - [`FinderError::PathNotFound`] if `root` does not exist
    /// - [`FinderError::Interrupted`] if the shutdown flag was set
    /// - [`FinderError::Scan`] if `root` cannot be inspected
    /// - [`FinderError::ThreadPool`] if worker threads cannot be spawned
    pub fn find_duplicates(
        &self,
        root: &Path,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!("Starting duplicate scan of {}", root.display());

        let files = self.scan(root, &mut summary)?;
        summary.total_files = files.len();

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let (size_groups, size_stats) = group_by_size(files);
        summary.total_size = size_stats.total_size;
        summary.empty_files = size_stats.empty_files;
        summary.unreadable_files = size_stats.unreadable_files;
        summary.eliminated_by_size = size_stats.total_files
            - size_stats.potential_duplicates
            - size_stats.empty_files
            - size_stats.unreadable_files;

        log::info!(
            "Size grouping: {} files -> {} candidates in {} groups ({:.1}% eliminated)",
            size_stats.total_files,
            size_stats.potential_duplicates,
            size_stats.size_groups,
            size_stats.elimination_rate()
        );

        if size_groups.is_empty() {
            log::info!("No files share a size, scan complete");
            summary.scan_duration = start_time.elapsed();
            return Ok((Vec::new(), summary));
        }

        let candidates = size_stats.potential_duplicates;
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_CONTENT, candidates);
        }

        let processed = AtomicUsize::new(0);
        let on_file = |path: &Path| {
            let current = processed.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_progress(current, path.to_string_lossy().as_ref());
            }
        };

        log::info!(
            "Content grouping ({}): {} candidates on {} threads",
            match self.config.strategy {
                Strategy::Checksum => self.hasher.algorithm().to_string(),
                Strategy::Compare => "pairwise".to_string(),
            },
            candidates,
            self.config.io_threads
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()?;

        let outcomes: Vec<GroupOutcome> = pool.install(|| {
            size_groups
                .into_par_iter()
                .map(|group| {
                    if self.config.is_shutdown_requested() {
                        return GroupOutcome::default();
                    }
                    match self.config.strategy {
                        Strategy::Checksum => {
                            group_by_checksum_with_progress(group, &self.hasher, &on_file)
                        }
                        Strategy::Compare => self
                            .comparator
                            .group_by_comparison_with_progress(group, &on_file),
                    }
                })
                .collect()
        });

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_CONTENT);
        }

        if self.config.is_shutdown_requested() {
            log::info!("Content grouping interrupted by shutdown signal");
            return Err(FinderError::Interrupted);
        }

        let mut groups = Vec::new();
        for outcome in outcomes {
            summary.unreadable_files += outcome.unreadable;
            groups.extend(outcome.groups);
        }

        let grouped_files: usize = groups.iter().map(DuplicateGroup::len).sum();
        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        summary.eliminated_by_content = candidates
            .saturating_sub(grouped_files)
            .saturating_sub(summary.unreadable_files - size_stats.unreadable_files);
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Found {} duplicate groups ({} redundant files, {} reclaimable) in {:.2?}",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display(),
            summary.scan_duration
        );

        Ok((groups, summary))
    }

    /// Walk `root` and collect candidate paths in traversal order.
    fn scan(&self, root: &Path, summary: &mut ScanSummary) -> Result<Vec<PathBuf>, FinderError> {
        let mut walker = Walker::new(root, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(Arc::clone(callback));
        }

        let entries = walker.walk().map_err(|e| match e {
            ScanError::NotFound(path) => FinderError::PathNotFound(path),
            other => FinderError::Scan(other),
        })?;

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_SCAN, 0);
            callback.on_message(&format!("Scanning {}", root.display()));
        }

        let mut files = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => files.push(path),
                Err(e) => {
                    log::warn!("{e}");
                    summary.scan_errors += 1;
                }
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_SCAN);
        }

        log::info!("Scan found {} files under {}", files.len(), root.display());
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[derive(Default)]
    struct RecordingCallback {
        events: Mutex<Vec<String>>,
        progress: AtomicUsize,
    }

    impl ProgressCallback for RecordingCallback {
        fn on_phase_start(&self, phase: &str, total: usize) {
            self.events.lock().unwrap().push(format!("start:{phase}:{total}"));
        }

        fn on_progress(&self, _current: usize, _path: &str) {
            self.progress.fetch_add(1, Ordering::SeqCst);
        }

        fn on_phase_end(&self, phase: &str) {
            self.events.lock().unwrap().push(format!("end:{phase}"));
        }
    }

    #[test]
    fn test_finder_config_default() {
        let config = FinderConfig::default();
        assert_eq!(config.strategy, Strategy::Checksum);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Blake3);
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(config.io_threads, 4);
        assert!(config.shutdown_flag.is_none());
        assert!(config.progress_callback.is_none());
    }

    #[test]
    fn test_finder_config_builder_clamps() {
        let config = FinderConfig::default()
            .with_fast(true)
            .with_io_threads(0)
            .with_buffer_size(0);
        assert_eq!(config.strategy, Strategy::Compare);
        assert_eq!(config.io_threads, 1);
        assert_eq!(config.buffer_size, 1);

        let debug = format!("{config:?}");
        assert!(debug.contains("Compare"));
    }

    #[test]
    fn test_find_duplicates_both_strategies() {
        let dir = TempDir::new().unwrap();
        let a = create_file(dir.path(), "a", b"X");
        let b = create_file(dir.path(), "b", b"X");
        create_file(dir.path(), "c", b"Y");

        for strategy in [Strategy::Checksum, Strategy::Compare] {
            let finder = DuplicateFinder::new(FinderConfig::default().with_strategy(strategy));
            let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

            assert_eq!(groups.len(), 1, "{strategy:?}");
            assert_eq!(groups[0].files, vec![a.clone(), b.clone()]);
            assert_eq!(summary.total_files, 3);
            assert_eq!(summary.duplicate_groups, 1);
            assert_eq!(summary.duplicate_files, 1);
            assert_eq!(summary.reclaimable_space, 1);
            assert_eq!(summary.eliminated_by_content, 1);
        }
    }

    #[test]
    fn test_find_duplicates_summary_counts() {
        let dir = TempDir::new().unwrap();
        create_file(dir.path(), "a", b"same");
        create_file(dir.path(), "b", b"same");
        create_file(dir.path(), "unique", b"unique-length");
        create_file(dir.path(), "empty1", b"");
        create_file(dir.path(), "empty2", b"");

        let (groups, summary) = DuplicateFinder::with_defaults()
            .find_duplicates(dir.path())
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(summary.total_files, 5);
        assert_eq!(summary.empty_files, 2);
        assert_eq!(summary.eliminated_by_size, 1);
        assert_eq!(summary.eliminated_by_content, 0);
        assert_eq!(summary.total_size, 4 + 4 + 13);
    }

    #[test]
    fn test_find_duplicates_no_duplicates_is_empty() {
        let dir = TempDir::new().unwrap();
        create_file(dir.path(), "a", b"one");
        create_file(dir.path(), "b", b"four");

        let (groups, summary) = DuplicateFinder::with_defaults()
            .find_duplicates(dir.path())
            .unwrap();
        assert!(groups.is_empty());
        assert_eq!(summary.duplicate_groups, 0);
        assert_eq!(summary.reclaimable_display(), ByteSize::b(0).to_string());
    }

    #[test]
    fn test_find_duplicates_missing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let err = DuplicateFinder::with_defaults()
            .find_duplicates(&missing)
            .unwrap_err();
        assert!(matches!(err, FinderError::PathNotFound(p) if p == missing));
    }

    #[test]
    fn test_find_duplicates_interrupted() {
        let dir = TempDir::new().unwrap();
        create_file(dir.path(), "a", b"same");
        create_file(dir.path(), "b", b"same");

        let flag = Arc::new(AtomicBool::new(true));
        let finder = DuplicateFinder::new(FinderConfig::default().with_shutdown_flag(flag));
        assert!(matches!(
            finder.find_duplicates(dir.path()),
            Err(FinderError::Interrupted)
        ));
    }

    #[test]
    fn test_groups_follow_size_group_order_across_threads() {
        let dir = TempDir::new().unwrap();
        let mut expected = Vec::new();
        for i in 0..20u8 {
            let content = vec![i; usize::from(i) + 1];
            let first = create_file(dir.path(), &format!("d{i:02}/one"), &content);
            let second = create_file(dir.path(), &format!("d{i:02}/two"), &content);
            expected.push(vec![first, second]);
        }

        let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(8));
        let (groups, _) = finder.find_duplicates(dir.path()).unwrap();
        let files: Vec<_> = groups.into_iter().map(|g| g.files).collect();
        assert_eq!(files, expected);
    }

    #[test]
    fn test_progress_callback_phases() {
        let dir = TempDir::new().unwrap();
        create_file(dir.path(), "a", b"same");
        create_file(dir.path(), "b", b"same");
        create_file(dir.path(), "c", b"diff");

        let callback = Arc::new(RecordingCallback::default());
        let config = FinderConfig::default().with_progress_callback(callback.clone());
        DuplicateFinder::new(config).find_duplicates(dir.path()).unwrap();

        let events = callback.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                format!("start:{PHASE_SCAN}:0"),
                format!("end:{PHASE_SCAN}"),
                format!("start:{PHASE_CONTENT}:3"),
                format!("end:{PHASE_CONTENT}"),
            ]
        );
        // 3 walker reports + 3 content reports
        assert_eq!(callback.progress.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_scan_summary_percentages() {
        let summary = ScanSummary {
            total_size: 1000,
            reclaimable_space: 250,
            ..Default::default()
        };
        assert!((summary.wasted_percentage() - 25.0).abs() < f64::EPSILON);
        assert_eq!(ScanSummary::default().wasted_percentage(), 0.0);
    }
}
