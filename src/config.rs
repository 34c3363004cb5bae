//! Layered application configuration.
//!
//! Values are merged with `figment`, later sources winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. TOML file: `--config FILE`, or `config.toml` in the platform
//!    configuration directory when it exists
//! 3. Environment variables prefixed with `DUPFIND_` (e.g. `DUPFIND_FAST=true`)
//! 4. Command-line flags
//!
//! ```toml
//! fast = false
//! hash = "sha256"
//! buffer_size = 65536
//! io_threads = 8
//! output = "text"
//! max_depth = 10
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, OutputFormat};
use crate::scanner::{HashAlgorithm, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};

const ENV_PREFIX: &str = "DUPFIND_";

/// Default number of worker threads for size-group processing.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Effective configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Use pairwise comparison instead of hashing.
    pub fast: bool,
    pub hash: HashAlgorithm,
    /// Read/compare chunk size in bytes.
    pub buffer_size: usize,
    pub io_threads: usize,
    pub output: OutputFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fast: false,
            hash: HashAlgorithm::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            io_threads: DEFAULT_IO_THREADS,
            output: OutputFormat::default(),
            max_depth: None,
        }
    }
}

/// Values given on the command line. Absent flags are not serialized, so
/// they leave lower layers untouched.
#[derive(Debug, Default, Serialize)]
struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    fast: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash: Option<HashAlgorithm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    buffer_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    io_threads: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<OutputFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_depth: Option<usize>,
}

impl From<&Cli> for CliOverrides {
    fn from(cli: &Cli) -> Self {
        Self {
            // --fast can only switch the fast path on
            fast: cli.fast.then_some(true),
            hash: cli.hash,
            buffer_size: cli.buffer_size,
            io_threads: cli.io_threads.map(usize::from),
            output: cli.output,
            max_depth: cli.max_depth,
        }
    }
}

impl Config {
    /// Load the configuration for a CLI invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit `--config` file does not exist, if any
    /// source holds a value of the wrong type, or if the merged values are
    /// out of range.
    pub fn load(cli: &Cli) -> Result<Self> {
        let figment = base_figment(cli.config.as_deref(), ENV_PREFIX)?
            .merge(Serialized::defaults(CliOverrides::from(cli)));
        Self::extract(&figment)
    }

    fn extract(figment: &Figment) -> Result<Self> {
        let config: Self = figment
            .extract()
            .context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error if `buffer_size` or `io_threads` is zero, or if
    /// `buffer_size` exceeds [`MAX_BUFFER_SIZE`].
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            bail!("Invalid configuration: buffer_size must be greater than zero");
        }
        if self.buffer_size > MAX_BUFFER_SIZE {
            bail!(
                "Invalid configuration: buffer_size {} exceeds the maximum of {MAX_BUFFER_SIZE} bytes",
                self.buffer_size
            );
        }
        if self.io_threads == 0 {
            bail!("Invalid configuration: io_threads must be greater than zero");
        }
        Ok(())
    }

    /// Default configuration file location, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupfind").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

fn base_figment(config_file: Option<&Path>, env_prefix: &str) -> Result<Figment> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    match config_file {
        Some(path) => {
            if !path.is_file() {
                bail!("Configuration file not found: {}", path.display());
            }
            log::debug!("Using configuration file {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        None => {
            if let Some(path) = Config::default_path().filter(|p| p.is_file()) {
                log::debug!("Using configuration file {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }
    }

    Ok(figment.merge(Env::prefixed(env_prefix)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("dupfind.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.fast);
        assert_eq!(config.hash, HashAlgorithm::Blake3);
        assert_eq!(config.buffer_size, 8 * 1024);
        assert_eq!(config.io_threads, DEFAULT_IO_THREADS);
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(config.max_depth, None);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "fast = true\nhash = \"md5\"\nbuffer_size = 4096\noutput = \"text\"\n",
        );

        let figment = base_figment(Some(&path), "DUPFIND_TEST_FILE_").unwrap();
        let config = Config::extract(&figment).unwrap();
        assert!(config.fast);
        assert_eq!(config.hash, HashAlgorithm::Md5);
        assert_eq!(config.buffer_size, 4096);
        assert_eq!(config.output, OutputFormat::Text);
        assert_eq!(config.io_threads, DEFAULT_IO_THREADS);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "io_threads = 2\n");
        std::env::set_var("DUPFIND_TEST_ENV_IO_THREADS", "6");

        let figment = base_figment(Some(&path), "DUPFIND_TEST_ENV_").unwrap();
        let config = Config::extract(&figment).unwrap();
        std::env::remove_var("DUPFIND_TEST_ENV_IO_THREADS");

        assert_eq!(config.io_threads, 6);
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "hash = \"sha256\"\nbuffer_size = 4096\n");
        let cli = Cli::try_parse_from([
            "dupfind",
            "-p",
            "/p",
            "--config",
            path.to_str().unwrap(),
            "--buffer-size",
            "1KiB",
            "--fast",
        ])
        .unwrap();

        let config = Config::load(&cli).unwrap();
        assert!(config.fast);
        assert_eq!(config.buffer_size, 1024);
        // Not given on the command line, so the file value stays
        assert_eq!(config.hash, HashAlgorithm::Sha256);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = base_figment(Some(Path::new("/nonexistent/dupfind.toml")), ENV_PREFIX)
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_invalid_value_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "hash = \"crc32\"\n");
        let figment = base_figment(Some(&path), "DUPFIND_TEST_INVALID_").unwrap();
        assert!(Config::extract(&figment).is_err());
    }

    #[test]
    fn test_zero_buffer_size_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "buffer_size = 0\n");
        let figment = base_figment(Some(&path), "DUPFIND_TEST_ZERO_").unwrap();
        let err = Config::extract(&figment).unwrap_err();
        assert!(err.to_string().contains("buffer_size"));
    }

    #[test]
    fn test_oversized_buffer_size_in_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "buffer_size = 4398046511104\n");
        let figment = base_figment(Some(&path), "DUPFIND_TEST_HUGE_FILE_").unwrap();
        let err = Config::extract(&figment).unwrap_err();
        assert!(err.to_string().contains("exceeds the maximum"));
    }

    #[test]
    fn test_oversized_buffer_size_in_env_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "");
        std::env::set_var("DUPFIND_TEST_HUGE_ENV_BUFFER_SIZE", "4398046511104");

        let figment = base_figment(Some(&path), "DUPFIND_TEST_HUGE_ENV_").unwrap();
        let result = Config::extract(&figment);
        std::env::remove_var("DUPFIND_TEST_HUGE_ENV_BUFFER_SIZE");

        assert!(result.is_err());
    }

    #[test]
    fn test_largest_buffer_size_accepted() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, &format!("buffer_size = {MAX_BUFFER_SIZE}\n"));
        let figment = base_figment(Some(&path), "DUPFIND_TEST_MAX_").unwrap();
        assert_eq!(Config::extract(&figment).unwrap().buffer_size, MAX_BUFFER_SIZE);
    }
}
