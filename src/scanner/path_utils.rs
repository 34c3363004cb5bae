//! Root path resolution utilities.
//!
//! The engine expects an absolute, normalized root so that every reported
//! file path is absolute and free of `.`/`..` components. This module turns
//! user input (`~/Downloads`, `../photos`, `./a/../b`) into such a path
//! without touching the filesystem beyond reading the current directory.
//!
//! # Example
//!
//! ```
//! use dupfind::scanner::path_utils::normalize_lexically;
//! use std::path::{Path, PathBuf};
//!
//! assert_eq!(
//!     normalize_lexically(Path::new("/data/./photos/../music")),
//!     PathBuf::from("/data/music")
//! );
//! ```

use std::io;
use std::path::{Component, Path, PathBuf};

use directories::BaseDirs;

/// Expand a leading `~` to the current user's home directory.
///
/// Only a bare `~` or a `~/` prefix is expanded; `~user` forms are left
/// untouched, as is everything when no home directory can be determined.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match BaseDirs::new() {
        Some(dirs) if rest.as_os_str().is_empty() => dirs.home_dir().to_path_buf(),
        Some(dirs) => dirs.home_dir().join(rest),
        None => {
            log::debug!("No home directory available, leaving {}", path.display());
            path.to_path_buf()
        }
    }
}

/// Remove `.` components and resolve `..` against preceding components.
///
/// Purely lexical: symlinks are not consulted. `..` at the root stays at
/// the root.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

/// Resolve user input into the absolute, normalized scan root.
///
/// # Errors
///
/// Returns an error if the path is relative and the current directory
/// cannot be determined.
pub fn resolve_root(path: &Path) -> io::Result<PathBuf> {
    let expanded = expand_tilde(path);
    let absolute = std::path::absolute(&expanded)?;
    Ok(normalize_lexically(&absolute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_removes_cur_dir() {
        assert_eq!(
            normalize_lexically(Path::new("/a/./b/.")),
            PathBuf::from("/a/b")
        );
    }

    #[test]
    fn test_normalize_resolves_parent_dir() {
        assert_eq!(
            normalize_lexically(Path::new("/a/b/../c")),
            PathBuf::from("/a/c")
        );
    }

    #[test]
    fn test_normalize_parent_at_root_stays_at_root() {
        assert_eq!(normalize_lexically(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn test_normalize_relative_leading_parent_kept() {
        assert_eq!(
            normalize_lexically(Path::new("../a/./b")),
            PathBuf::from("../a/b")
        );
    }

    #[test]
    fn test_normalize_empty_becomes_cur_dir() {
        assert_eq!(normalize_lexically(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn test_expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde(Path::new("/tmp/x")), PathBuf::from("/tmp/x"));
        assert_eq!(expand_tilde(Path::new("~user/x")), PathBuf::from("~user/x"));
    }

    #[test]
    fn test_expand_tilde_home() {
        if let Some(dirs) = BaseDirs::new() {
            assert_eq!(
                expand_tilde(Path::new("~/docs")),
                dirs.home_dir().join("docs")
            );
            assert_eq!(expand_tilde(Path::new("~")), dirs.home_dir().to_path_buf());
        }
    }

    #[test]
    fn test_resolve_root_is_absolute() {
        let resolved = resolve_root(Path::new("some/../relative/./dir")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("relative/dir"));
    }
}
