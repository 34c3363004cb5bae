//! Directory walker implementation using jwalk.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct, which turns a root directory
//! into the flat, ordered candidate set used by duplicate detection.
//!
//! # Features
//!
//! - Children sorted by file name, so the candidate order is deterministic
//! - Symbolic links are never followed and never reported
//! - Unreadable directories are reported as [`ScanError`] items and skipped
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dupfind::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let files: Vec<_> = walker.walk().unwrap().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::{ScanError, WalkerConfig};
use crate::progress::ProgressCallback;

/// Directory walker for file discovery.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback, notified once per discovered file
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// The path should already be absolute and normalized (see
    /// [`crate::scanner::path_utils::resolve_root`]); every reported file
    /// path is built by joining entry names onto it.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
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

    /// Walk the directory tree, yielding regular file paths.
    ///
    /// The root is validated up front: a root that does not exist fails with
    /// [`ScanError::NotFound`]. A root that exists but is not a directory
    /// yields nothing. Once walking, per-entry failures (unreadable
    /// directories, entries that vanish mid-walk) are yielded as `Err` items
    /// and iteration continues with the next entry.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the root cannot be inspected at all.
    pub fn walk(
        &self,
    ) -> Result<Box<dyn Iterator<Item = Result<PathBuf, ScanError>> + '_>, ScanError> {
        let metadata =
            fs::metadata(&self.root).map_err(|e| ScanError::from_io(self.root.clone(), e))?;

        if !metadata.is_dir() {
            log::debug!(
                "Root is not a directory, nothing to walk: {}",
                self.root.display()
            );
            return Ok(Box::new(std::iter::empty()));
        }

        // A root given as a symlink is walked through its target, and paths
        // are reported under the root as given. Nothing below it is followed.
        let walk_root = match fs::symlink_metadata(&self.root) {
            Ok(m) if m.file_type().is_symlink() => fs::canonicalize(&self.root)
                .map_err(|e| ScanError::from_io(self.root.clone(), e))?,
            _ => self.root.clone(),
        };

        let mut walk_dir = WalkDir::new(&walk_root)
            .follow_links(false)
            .skip_hidden(false)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });
        if let Some(depth) = self.config.max_depth {
            walk_dir = walk_dir.max_depth(depth);
        }

        let mut discovered = 0usize;

        let iter = walk_dir
            .into_iter()
            .take_while(move |_| {
                let stop = self.is_shutdown_requested();
                if stop {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                }
                !stop
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    let file_type = entry.file_type();

                    if file_type.is_symlink() {
                        log::trace!("Skipping symlink: {}", entry.path().display());
                        return None;
                    }

                    // Directories, sockets, fifos and devices are not candidates
                    if !file_type.is_file() {
                        return None;
                    }

                    let path = self.rebase(entry.path(), &walk_root);
                    discovered += 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback.on_progress(discovered, path.to_string_lossy().as_ref());
                    }
                    Some(Ok(path))
                }
                Err(e) => Some(Err(self.handle_jwalk_error(e))),
            });

        Ok(Box::new(iter))
    }

    /// Re-anchor a path found under `walk_root` onto the root as given.
    fn rebase(&self, path: PathBuf, walk_root: &Path) -> PathBuf {
        match path.strip_prefix(walk_root) {
            Ok(relative) if walk_root != self.root => self.root.join(relative),
            _ => path,
        }
    }

    /// Convert a jwalk error into a [`ScanError`], logging it.
    fn handle_jwalk_error(&self, error: jwalk::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);

        match error.io_error().map(std::io::Error::kind) {
            Some(std::io::ErrorKind::PermissionDenied) => {
                log::warn!("Permission denied, skipping: {}", path.display());
                ScanError::PermissionDenied(path)
            }
            Some(std::io::ErrorKind::NotFound) => {
                log::debug!("Entry vanished during walk: {}", path.display());
                ScanError::NotFound(path)
            }
            _ => {
                log::warn!("Walker error for {}: {}", path.display(), error);
                ScanError::Io {
                    path,
                    source: std::io::Error::other(error.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    /// Create a test directory with some files.
    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        let mut f = File::create(dir.path().join("file1.txt")).unwrap();
        writeln!(f, "Hello, world!").unwrap();

        let mut f = File::create(dir.path().join("file2.txt")).unwrap();
        writeln!(f, "Another file").unwrap();

        let subdir = dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();

        let mut f = File::create(subdir.join("nested.txt")).unwrap();
        writeln!(f, "Nested file content").unwrap();

        dir
    }

    fn walk_ok(dir: &Path) -> Vec<PathBuf> {
        Walker::new(dir, WalkerConfig::default())
            .walk()
            .unwrap()
            .filter_map(Result::ok)
            .collect()
    }

    #[test]
    fn test_walker_finds_files() {
        let dir = create_test_dir();
        let files = walk_ok(dir.path());

        assert_eq!(files.len(), 3);
        for file in &files {
            assert!(file.is_absolute());
            assert!(file.starts_with(dir.path()));
        }
    }

    #[test]
    fn test_walker_order_is_sorted_and_stable() {
        let dir = TempDir::new().unwrap();
        for name in ["c.txt", "a.txt", "b.txt"] {
            fs::write(dir.path().join(name), name).unwrap();
        }

        let first = walk_ok(dir.path());
        let second = walk_ok(dir.path());

        let names: Vec<_> = first
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_walker_reports_empty_files() {
        // Zero-size exclusion belongs to size grouping, not to the walker
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("empty.txt")).unwrap();

        let files = walk_ok(dir.path());
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_walker_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(walk_ok(dir.path()).is_empty());
    }

    #[test]
    fn test_walker_nonexistent_root_is_not_found() {
        let walker = Walker::new(
            Path::new("/nonexistent/path/12345"),
            WalkerConfig::default(),
        );

        match walker.walk() {
            Err(ScanError::NotFound(path)) => {
                assert_eq!(path, PathBuf::from("/nonexistent/path/12345"));
            }
            Err(other) => panic!("Expected NotFound, got {other}"),
            Ok(_) => panic!("Expected NotFound, got an iterator"),
        };
    }

    #[test]
    fn test_walker_file_root_yields_nothing() {
        let dir = create_test_dir();
        let files = walk_ok(&dir.path().join("file1.txt"));
        assert!(files.is_empty());
    }

    #[test]
    fn test_walker_max_depth() {
        let dir = create_test_dir();
        let config = WalkerConfig::default().with_max_depth(Some(1));
        let files: Vec<_> = Walker::new(dir.path(), config)
            .walk()
            .unwrap()
            .filter_map(Result::ok)
            .collect();

        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.parent() == Some(dir.path())));
    }

    #[test]
    #[cfg(unix)]
    fn test_walker_skips_symlinks() {
        use std::os::unix::fs::symlink;

        let dir = create_test_dir();
        symlink(dir.path().join("file1.txt"), dir.path().join("link.txt")).unwrap();
        symlink(dir.path().join("subdir"), dir.path().join("linkdir")).unwrap();

        let files = walk_ok(dir.path());

        assert_eq!(files.len(), 3);
        for file in &files {
            let name = file.file_name().unwrap().to_str().unwrap();
            assert_ne!(name, "link.txt");
            assert!(!file.starts_with(dir.path().join("linkdir")));
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_walker_symlinked_root_reports_given_path() {
        use std::os::unix::fs::symlink;

        let dir = create_test_dir();
        let outer = TempDir::new().unwrap();
        let link = outer.path().join("link");
        symlink(dir.path(), &link).unwrap();

        let mut files = walk_ok(&link);
        files.sort();

        assert_eq!(
            files,
            vec![
                link.join("file1.txt"),
                link.join("file2.txt"),
                link.join("subdir").join("nested.txt"),
            ]
        );
    }

    #[test]
    fn test_walker_shutdown_flag() {
        let dir = create_test_dir();
        for i in 0..10 {
            fs::write(dir.path().join(format!("extra{i}.txt")), "x").unwrap();
        }

        let shutdown = Arc::new(AtomicBool::new(true));
        let walker =
            Walker::new(dir.path(), WalkerConfig::default()).with_shutdown_flag(shutdown);

        let files: Vec<_> = walker.walk().unwrap().collect();
        assert!(files.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn test_walker_skips_unreadable_directory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = create_test_dir();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.txt"), "secret").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permissions are not enforced for root; nothing to assert then
        let enforced = fs::read_dir(&locked).is_err();

        let results: Vec<_> = Walker::new(dir.path(), WalkerConfig::default())
            .walk()
            .unwrap()
            .collect();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let files: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        if enforced {
            assert_eq!(files.len(), 3);
            assert!(results.iter().any(Result::is_err));
        } else {
            assert_eq!(files.len(), 4);
        }
    }
}
