//! Streaming whole-file content hasher.
//!
//! # Overview
//!
//! The [`Hasher`] reads a file in fixed-size chunks and feeds each chunk to
//! the selected [`HashAlgorithm`], so memory use stays bounded by the buffer
//! size regardless of file length. BLAKE3 is the default; SHA-256 and MD5
//! are available for interoperability with other tools.
//!
//! All algorithms produce a [`ContentHash`], so grouping code never needs to
//! know which digest is in use.

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::HashError;

/// Default chunk size for streaming reads and pairwise comparison (8 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Largest accepted chunk size (64 MiB); each reader allocates one buffer
/// of this size.
pub const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// Largest digest produced by any supported algorithm.
const MAX_DIGEST_LEN: usize = 32;

/// Content digest algorithm.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3 (256-bit)
    #[default]
    Blake3,
    /// SHA-256
    Sha256,
    /// MD5 (128-bit, non-cryptographic use only)
    Md5,
}

impl HashAlgorithm {
    /// Digest length in bytes.
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            Self::Blake3 | Self::Sha256 => 32,
            Self::Md5 => 16,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blake3 => write!(f, "blake3"),
            Self::Sha256 => write!(f, "sha256"),
            Self::Md5 => write!(f, "md5"),
        }
    }
}

/// Fixed-size digest of a file's full content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash {
    bytes: [u8; MAX_DIGEST_LEN],
    len: u8,
}

impl ContentHash {
    /// Build a digest from raw bytes.
    ///
    /// # Panics
    ///
    /// Panics if `digest` is longer than 32 bytes.
    #[must_use]
    pub fn from_slice(digest: &[u8]) -> Self {
        assert!(
            digest.len() <= MAX_DIGEST_LEN,
            "digest of {} bytes exceeds {MAX_DIGEST_LEN}",
            digest.len()
        );
        let mut bytes = [0u8; MAX_DIGEST_LEN];
        bytes[..digest.len()].copy_from_slice(digest);
        Self {
            bytes,
            len: digest.len() as u8,
        }
    }

    /// The digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", hash_to_hex(self))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hash_to_hex(self))
    }
}

/// Convert a digest to a lowercase hexadecimal string.
#[must_use]
pub fn hash_to_hex(hash: &ContentHash) -> String {
    hash.as_bytes().iter().map(|b| format!("{b:02x}")).collect()
}

/// In-progress digest state for one file.
enum DigestState {
    Blake3(Box<blake3::Hasher>),
    Sha256(Sha256),
    Md5(Md5),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Md5 => Self::Md5(Md5::new()),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Blake3(h) => {
                h.update(chunk);
            }
            Self::Sha256(h) => h.update(chunk),
            Self::Md5(h) => h.update(chunk),
        }
    }

    fn finalize(self) -> ContentHash {
        match self {
            Self::Blake3(h) => ContentHash::from_slice(h.finalize().as_bytes()),
            Self::Sha256(h) => ContentHash::from_slice(&h.finalize()),
            Self::Md5(h) => ContentHash::from_slice(&h.finalize()),
        }
    }
}

/// Streaming file hasher.
///
/// # Example
///
/// ```no_run
/// use dupfind::scanner::{HashAlgorithm, Hasher};
/// use std::path::Path;
///
/// let hasher = Hasher::new().with_algorithm(HashAlgorithm::Sha256);
/// let digest = hasher.full_hash(Path::new("/etc/hosts")).unwrap();
/// println!("{digest}");
/// ```
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    buffer_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a BLAKE3 hasher with the default 8 KiB buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            shutdown_flag: None,
        }
    }

    /// Select the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the read chunk size (clamped to `1..=MAX_BUFFER_SIZE`).
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.clamp(1, MAX_BUFFER_SIZE);
        self
    }

    /// Set the shutdown flag; hashing stops between chunks once it is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Compute the digest of the entire file content.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read, or if
    /// shutdown was requested mid-file.
    pub fn full_hash(&self, path: &Path) -> Result<ContentHash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))?;
        self.hash_reader(path, file)
    }

    /// Compute the digest of everything `reader` yields.
    ///
    /// `path` is only used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] on read failure or shutdown.
    pub fn hash_reader<R: Read>(&self, path: &Path, mut reader: R) -> Result<ContentHash, HashError> {
        let mut state = DigestState::new(self.algorithm);
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => state.update(&buffer[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path.to_path_buf(), e)),
            }
        }

        Ok(state.finalize())
    }

    /// Digest of an in-memory byte slice.
    #[must_use]
    pub fn hash_bytes(&self, data: &[u8]) -> ContentHash {
        let mut state = DigestState::new(self.algorithm);
        state.update(data);
        state.finalize()
    }
}
