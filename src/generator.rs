//! Random file tree generator for exercising the duplicate finder.
//!
//! Creates `file_count` files of random content under randomly named
//! sub-directories, copying an earlier file instead of writing fresh bytes
//! often enough to keep the share of copies at `duplicate_ratio`.
//!
//! Directory components are single hexadecimal characters, so trees of a
//! few thousand files end up with many siblings sharing a directory, and
//! file names are drawn from `[-_A-Za-z0-9]`.
//!
//! # Example
//!
//! ```no_run
//! use dupfind::generator::{generate_files, GeneratorConfig};
//!
//! let config = GeneratorConfig::new("/tmp/tree", 100)
//!     .with_size_range(1024, 64 * 1024)
//!     .with_duplicate_ratio(0.3);
//! let files = generate_files(&config).unwrap();
//! println!("created {} files", files.len());
//! ```

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Characters allowed in generated file names and extensions.
pub const FILE_NAME_CHARACTERS: &[u8] =
    b"-_abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Characters used for generated directory names.
pub const DIRECTORY_NAME_CHARACTERS: &[u8] = b"0123456789abcdef";

const ONE_KB: u64 = 1024;
const ONE_GB: u64 = 1024 * 1024 * 1024;

/// Name attempts before giving up on finding an unused path.
const MAX_NAME_ATTEMPTS: usize = 64;

const WRITE_CHUNK: usize = 8 * 1024;

/// Errors raised while generating a tree.
#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
    /// A configuration value is out of range.
    #[error("Invalid generator configuration: {0}")]
    InvalidConfig(String),

    /// No unused file name could be found in a directory.
    #[error("Could not find an unused file name in {0}")]
    NameExhausted(PathBuf),

    /// Creating a directory or writing a file failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path being created
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GenerateError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Parameters for [`generate_files`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Directory the tree is created in
    pub root: PathBuf,
    pub file_count: usize,
    /// Fixed depth when `None`, otherwise depth is drawn from
    /// `directory_min_depth..=directory_max_depth`
    pub directory_min_depth: Option<usize>,
    pub directory_max_depth: usize,
    /// Fraction of files that are copies of earlier files
    pub duplicate_ratio: f64,
    /// Extensions to choose from; random extensions when empty
    pub file_extensions: Vec<String>,
    pub extension_min_length: usize,
    /// Zero disables extensions entirely
    pub extension_max_length: usize,
    pub name_min_length: usize,
    pub name_max_length: usize,
    pub file_min_size: u64,
    pub file_max_size: u64,
}

impl GeneratorConfig {
    /// Configuration with the classic defaults: depth 8, 20% copies,
    /// 3-character extensions, names of 1 to 8 characters, and sizes from
    /// 1 KiB to 1 GiB.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, file_count: usize) -> Self {
        Self {
            root: root.into(),
            file_count,
            directory_min_depth: None,
            directory_max_depth: 8,
            duplicate_ratio: 0.2,
            file_extensions: Vec::new(),
            extension_min_length: 3,
            extension_max_length: 3,
            name_min_length: 1,
            name_max_length: 8,
            file_min_size: ONE_KB,
            file_max_size: ONE_GB,
        }
    }

    #[must_use]
    pub fn with_depth_range(mut self, min: Option<usize>, max: usize) -> Self {
        self.directory_min_depth = min;
        self.directory_max_depth = max;
        self
    }

    #[must_use]
    pub fn with_duplicate_ratio(mut self, ratio: f64) -> Self {
        self.duplicate_ratio = ratio;
        self
    }

    #[must_use]
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.file_extensions = extensions;
        self
    }

    #[must_use]
    pub fn with_extension_length(mut self, min: usize, max: usize) -> Self {
        self.extension_min_length = min;
        self.extension_max_length = max;
        self
    }

    #[must_use]
    pub fn with_name_length(mut self, min: usize, max: usize) -> Self {
        self.name_min_length = min;
        self.name_max_length = max;
        self
    }

    #[must_use]
    pub fn with_size_range(mut self, min: u64, max: u64) -> Self {
        self.file_min_size = min;
        self.file_max_size = max;
        self
    }

    /// Check that every range is well formed.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::InvalidConfig`] naming the offending value.
    pub fn validate(&self) -> Result<(), GenerateError> {
        let invalid = |msg: String| Err(GenerateError::InvalidConfig(msg));

        if !(0.0..1.0).contains(&self.duplicate_ratio) {
            return invalid(format!(
                "duplicate ratio must be in [0, 1), got {}",
                self.duplicate_ratio
            ));
        }
        if let Some(min) = self.directory_min_depth {
            if min > self.directory_max_depth {
                return invalid(format!(
                    "directory min depth {min} exceeds max depth {}",
                    self.directory_max_depth
                ));
            }
        }
        if self.name_min_length == 0 || self.name_min_length > self.name_max_length {
            return invalid(format!(
                "file name length range {}..={} is empty or starts at zero",
                self.name_min_length, self.name_max_length
            ));
        }
        if self.extension_max_length > 0
            && self.file_extensions.is_empty()
            && self.extension_min_length > self.extension_max_length
        {
            return invalid(format!(
                "extension length range {}..={} is empty",
                self.extension_min_length, self.extension_max_length
            ));
        }
        if self.file_min_size > self.file_max_size {
            return invalid(format!(
                "file size range {}..={} is empty",
                self.file_min_size, self.file_max_size
            ));
        }
        Ok(())
    }
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub size: u64,
    /// Index of the file this one was copied from, if it is a copy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_of: Option<usize>,
}

/// Generate a tree with the thread-local RNG.
///
/// # Errors
///
/// Returns [`GenerateError`] if the configuration is invalid or the tree
/// cannot be written.
pub fn generate_files(config: &GeneratorConfig) -> Result<Vec<GeneratedFile>, GenerateError> {
    generate_files_with_rng(config, &mut rand::thread_rng())
}

/// Generate a tree with a caller-supplied RNG (seed it for reproducible
/// trees).
///
/// # Errors
///
/// Same as [`generate_files`].
pub fn generate_files_with_rng<R: Rng>(
    config: &GeneratorConfig,
    rng: &mut R,
) -> Result<Vec<GeneratedFile>, GenerateError> {
    config.validate()?;

    let mut generated: Vec<GeneratedFile> = Vec::with_capacity(config.file_count);
    let mut copies = 0usize;

    for _ in 0..config.file_count {
        let directory = config.root.join(random_relative_path(config, rng));
        fs::create_dir_all(&directory).map_err(|e| GenerateError::io(&directory, e))?;
        let path = unused_file_path(&directory, config, rng)?;

        let wants_copy = generated.len() as f64 * config.duplicate_ratio > copies as f64;
        let file = if wants_copy && !generated.is_empty() {
            let source_index = rng.gen_range(0..generated.len());
            let source = &generated[source_index];
            let size = fs::copy(&source.path, &path).map_err(|e| GenerateError::io(&path, e))?;
            copies += 1;
            log::debug!("Copied {} -> {}", source.path.display(), path.display());
            GeneratedFile {
                path,
                size,
                copy_of: Some(source_index),
            }
        } else {
            let size = rng.gen_range(config.file_min_size..=config.file_max_size);
            write_random_file(&path, size, rng)?;
            log::debug!("Wrote {} ({} bytes)", path.display(), size);
            GeneratedFile {
                path,
                size,
                copy_of: None,
            }
        };
        generated.push(file);
    }

    log::info!(
        "Generated {} files ({} copies) under {}",
        generated.len(),
        copies,
        config.root.display()
    );
    Ok(generated)
}

fn random_chars<R: Rng>(alphabet: &[u8], len: usize, rng: &mut R) -> String {
    (0..len)
        .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
        .collect()
}

/// Random chain of single-character directory names.
fn random_relative_path<R: Rng>(config: &GeneratorConfig, rng: &mut R) -> PathBuf {
    let depth = match config.directory_min_depth {
        Some(min) => rng.gen_range(min..=config.directory_max_depth),
        None => config.directory_max_depth,
    };
    (0..depth)
        .map(|_| random_chars(DIRECTORY_NAME_CHARACTERS, 1, rng))
        .collect()
}

/// Random `name.ext` (or bare `name` when extensions are disabled).
pub fn random_file_name<R: Rng>(config: &GeneratorConfig, rng: &mut R) -> String {
    let name_len = rng.gen_range(config.name_min_length..=config.name_max_length);
    let base = random_chars(FILE_NAME_CHARACTERS, name_len, rng);

    if config.extension_max_length == 0 {
        return base;
    }

    let extension = match config.file_extensions.choose(rng) {
        Some(ext) => ext.clone(),
        None => {
            let len = rng.gen_range(config.extension_min_length..=config.extension_max_length);
            random_chars(FILE_NAME_CHARACTERS, len, rng)
        }
    };
    format!("{base}.{extension}")
}

fn unused_file_path<R: Rng>(
    directory: &Path,
    config: &GeneratorConfig,
    rng: &mut R,
) -> Result<PathBuf, GenerateError> {
    for _ in 0..MAX_NAME_ATTEMPTS {
        let candidate = directory.join(random_file_name(config, rng));
        if fs::symlink_metadata(&candidate).is_err() {
            return Ok(candidate);
        }
    }
    Err(GenerateError::NameExhausted(directory.to_path_buf()))
}

fn write_random_file<R: Rng>(path: &Path, size: u64, rng: &mut R) -> Result<(), GenerateError> {
    let file = File::create(path).map_err(|e| GenerateError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let mut chunk = [0u8; WRITE_CHUNK];
    let mut remaining = size;

    while remaining > 0 {
        let n = remaining.min(WRITE_CHUNK as u64) as usize;
        rng.fill(&mut chunk[..n]);
        writer
            .write_all(&chunk[..n])
            .map_err(|e| GenerateError::io(path, e))?;
        remaining -= n as u64;
    }

    writer.flush().map_err(|e| GenerateError::io(path, e))
}
