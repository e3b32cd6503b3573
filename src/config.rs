//! Configuration types for csum-walker
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - Human-readable size parsing for the chunk size

use crate::content::checksum::{
    ChecksumAlgorithm, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE,
};
use crate::error::ConfigError;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Two digests run at once per entry, so fewer workers would serialize them
const MIN_WORKERS: usize = 2;

/// Default stats file location
pub const DEFAULT_STATS_PATH: &str = "/tmp/output.json";

/// Default number of entries between stats flushes
pub const DEFAULT_FLUSH_EVERY: usize = 10;

/// Compare two directory trees file-by-file using checksums
#[derive(Parser, Debug, Clone)]
#[command(
    name = "csum-walker",
    version,
    about = "Compare two directory trees file-by-file using SHA-2 checksums",
    long_about = "Walks OLD_ROOT and, for every regular file, checksums the file at the same\n\
                  relative path under NEW_ROOT. Both files are read concurrently so two\n\
                  storage devices can be driven at once.\n\n\
                  Running statistics are written to a JSON file every few entries and once\n\
                  more at the end. Use csum-stats to pretty-print it.",
    after_help = "EXAMPLES:\n    \
        csum-walker /mnt/old /mnt/new\n    \
        csum-walker /mnt/old /mnt/new --checksum sha512 --verify\n    \
        csum-walker /data /backup -s 4MiB -o /var/tmp/compare.json\n    \
        csum-stats /var/tmp/compare.json --watch 5"
)]
pub struct CliArgs {
    /// Directory to take the file list from
    #[arg(value_name = "OLD_ROOT")]
    pub old_root: PathBuf,

    /// Directory to compare against
    #[arg(value_name = "NEW_ROOT")]
    pub new_root: PathBuf,

    /// Checksum algorithm (sha256 or sha512)
    #[arg(short = 'c', long, default_value = "sha256", value_name = "ALGO")]
    pub checksum: String,

    /// Also compare file content byte by byte
    #[arg(long)]
    pub verify: bool,

    /// Read chunk size (bytes, or with KiB/MiB/GiB suffix; minimum 2048)
    #[arg(short = 's', long, default_value = "16MiB", value_name = "SIZE")]
    pub chunk_size: String,

    /// Stats file to write
    #[arg(
        short = 'o',
        long,
        env = "CSUM_STATS_OUTPUT",
        default_value = DEFAULT_STATS_PATH,
        value_name = "FILE"
    )]
    pub stats_output: PathBuf,

    /// Number of digest worker threads
    #[arg(
        short = 'w',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Write the stats file every NUM entries
    #[arg(long, default_value_t = DEFAULT_FLUSH_EVERY, value_name = "NUM")]
    pub flush_every: usize,

    /// Quiet mode - suppress per-file progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_workers() -> usize {
    // Reads spend most of their time blocked on storage, so oversubscribe
    (num_cpus::get() * 2).max(MIN_WORKERS)
}

/// Parse a size like "2048", "4KiB", "16MiB" or "1GB" into bytes
///
/// Suffixes are binary (KB and KiB both mean 1024).
pub fn parse_size(s: &str) -> Result<usize, ConfigError> {
    let upper = s.trim().to_uppercase();

    let (num_str, multiplier) = [
        ("GIB", 1usize << 30),
        ("MIB", 1 << 20),
        ("KIB", 1 << 10),
        ("GB", 1 << 30),
        ("MB", 1 << 20),
        ("KB", 1 << 10),
        ("G", 1 << 30),
        ("M", 1 << 20),
        ("K", 1 << 10),
        ("B", 1),
    ]
    .iter()
    .find_map(|(suffix, mult)| upper.strip_suffix(suffix).map(|n| (n, *mult)))
    .unwrap_or((upper.as_str(), 1));

    let num: usize = num_str
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidChunkSize {
            value: s.to_string(),
            reason: "expected a whole number with an optional KiB/MiB/GiB suffix".into(),
        })?;

    num.checked_mul(multiplier)
        .ok_or_else(|| ConfigError::InvalidChunkSize {
            value: s.to_string(),
            reason: "size is out of range".into(),
        })
}

/// Validated runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareConfig {
    /// Root the file list is taken from
    pub old_root: PathBuf,

    /// Root compared against
    pub new_root: PathBuf,

    /// Checksum algorithm
    pub algorithm: ChecksumAlgorithm,

    /// Byte-for-byte verification in addition to checksums
    pub verify: bool,

    /// Read chunk size in bytes
    pub chunk_size: usize,

    /// Stats file path
    pub stats_path: PathBuf,

    /// Digest pool size
    pub worker_count: usize,

    /// Entries between stats flushes
    pub flush_every: usize,

    /// Show per-file progress
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl CompareConfig {
    /// Configuration with defaults for everything but the roots
    pub fn new(old_root: impl Into<PathBuf>, new_root: impl Into<PathBuf>) -> Self {
        Self {
            old_root: old_root.into(),
            new_root: new_root.into(),
            algorithm: ChecksumAlgorithm::default(),
            verify: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            stats_path: PathBuf::from(DEFAULT_STATS_PATH),
            worker_count: default_workers(),
            flush_every: DEFAULT_FLUSH_EVERY,
            show_progress: false,
            verbose: false,
        }
    }

    pub fn with_algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_stats_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.stats_path = path.into();
        self
    }

    pub fn with_workers(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn with_flush_every(mut self, every: usize) -> Self {
        self.flush_every = every;
        self
    }

    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let algorithm: ChecksumAlgorithm = args.checksum.parse()?;
        let chunk_size = parse_size(&args.chunk_size)?;

        let config = Self {
            old_root: args.old_root,
            new_root: args.new_root,
            algorithm,
            verify: args.verify,
            chunk_size,
            stats_path: args.stats_output,
            worker_count: args.workers,
            flush_every: args.flush_every,
            show_progress: !args.quiet,
            verbose: args.verbose,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check every option before any work is done
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size < MIN_CHUNK_SIZE {
            return Err(ConfigError::ChunkSizeTooSmall {
                size: self.chunk_size,
                min: MIN_CHUNK_SIZE,
            });
        }

        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(ConfigError::ChunkSizeTooLarge {
                size: self.chunk_size,
                max: MAX_CHUNK_SIZE,
            });
        }

        if self.worker_count < MIN_WORKERS || self.worker_count > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: self.worker_count,
                max: MAX_WORKERS,
            });
        }

        if self.flush_every == 0 {
            return Err(ConfigError::InvalidFlushInterval {
                every: self.flush_every,
            });
        }

        validate_root(&self.old_root)?;
        validate_root(&self.new_root)?;

        if let Some(parent) = self.stats_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(ConfigError::InvalidStatsPath {
                    path: self.stats_path.clone(),
                    reason: format!("Parent directory '{}' does not exist", parent.display()),
                });
            }
        }

        if self.stats_path.is_dir() {
            return Err(ConfigError::InvalidStatsPath {
                path: self.stats_path.clone(),
                reason: "Path is a directory".into(),
            });
        }

        Ok(())
    }
}

fn validate_root(path: &Path) -> Result<(), ConfigError> {
    if !path.is_dir() {
        return Err(ConfigError::InvalidRoot {
            path: path.to_path_buf(),
            reason: "Not a directory or does not exist".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(old: &Path, new: &Path) -> CliArgs {
        CliArgs::parse_from([
            "csum-walker",
            old.to_str().unwrap(),
            new.to_str().unwrap(),
            "-o",
            old.join("stats.json").to_str().unwrap(),
        ])
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("2048").unwrap(), 2048);
        assert_eq!(parse_size("4KiB").unwrap(), 4096);
        assert_eq!(parse_size("16MiB").unwrap(), 16 * 1024 * 1024);
        assert_eq!(parse_size("1mb").unwrap(), 1024 * 1024);
        assert_eq!(parse_size("1G").unwrap(), 1 << 30);
        assert_eq!(parse_size("512B").unwrap(), 512);
        assert!(parse_size("lots").is_err());
        assert!(parse_size("-5").is_err());
    }

    #[test]
    fn test_parse_size_rejects_fractions_and_overflow() {
        assert!(matches!(
            parse_size("1e30"),
            Err(ConfigError::InvalidChunkSize { .. })
        ));
        assert!(matches!(
            parse_size("1.5MiB"),
            Err(ConfigError::InvalidChunkSize { .. })
        ));
        assert!(matches!(
            parse_size("99999999999999999999GiB"),
            Err(ConfigError::InvalidChunkSize { .. })
        ));
    }

    #[test]
    fn test_chunk_size_ceiling() {
        let old = tempdir().unwrap();
        let mut a = args(old.path(), old.path());
        a.chunk_size = "64GiB".into();

        assert_eq!(
            CompareConfig::from_args(a),
            Err(ConfigError::ChunkSizeTooLarge {
                size: 64 << 30,
                max: MAX_CHUNK_SIZE
            })
        );

        let mut a = args(old.path(), old.path());
        a.chunk_size = "1GiB".into();
        assert!(CompareConfig::from_args(a).is_ok());
    }

    #[test]
    fn test_defaults() {
        let old = tempdir().unwrap();
        let new = tempdir().unwrap();
        let config = CompareConfig::from_args(args(old.path(), new.path())).unwrap();

        assert_eq!(config.algorithm, ChecksumAlgorithm::Sha256);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(!config.verify);
        assert_eq!(config.flush_every, DEFAULT_FLUSH_EVERY);
        assert!(config.worker_count >= MIN_WORKERS);
    }

    #[test]
    fn test_unsupported_algorithm_rejected() {
        let old = tempdir().unwrap();
        let new = tempdir().unwrap();
        let mut a = args(old.path(), new.path());
        a.checksum = "md5".into();

        assert!(matches!(
            CompareConfig::from_args(a),
            Err(ConfigError::UnsupportedAlgorithm { .. })
        ));
    }

    #[test]
    fn test_chunk_size_floor() {
        let old = tempdir().unwrap();
        let new = tempdir().unwrap();
        let mut a = args(old.path(), new.path());
        a.chunk_size = "1024".into();

        assert_eq!(
            CompareConfig::from_args(a),
            Err(ConfigError::ChunkSizeTooSmall {
                size: 1024,
                min: MIN_CHUNK_SIZE
            })
        );

        let mut a = args(old.path(), new.path());
        a.chunk_size = "2048".into();
        assert!(CompareConfig::from_args(a).is_ok());
    }

    #[test]
    fn test_missing_root_rejected() {
        let old = tempdir().unwrap();
        let config = CompareConfig::new(old.path(), old.path().join("nope"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRoot { .. })
        ));
    }

    #[test]
    fn test_invalid_workers_and_stats_path() {
        let old = tempdir().unwrap();
        let base = CompareConfig::new(old.path(), old.path())
            .with_stats_path(old.path().join("stats.json"));

        assert!(matches!(
            base.clone().with_workers(1).validate(),
            Err(ConfigError::InvalidWorkerCount { .. })
        ));
        assert!(matches!(
            base.clone().with_flush_every(0).validate(),
            Err(ConfigError::InvalidFlushInterval { .. })
        ));
        assert!(matches!(
            base.with_stats_path(old.path().join("missing/stats.json")).validate(),
            Err(ConfigError::InvalidStatsPath { .. })
        ));
    }
}
