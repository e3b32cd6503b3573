//! csum-walker - Checksum-based directory tree comparison
//!
//! Compares an "old" and a "new" directory tree file by file, for validating
//! data migrations, backups and replicas. Traversal is driven by the old
//! root; every regular file there is checksummed together with the file at
//! the same relative path under the new root.
//!
//! # Features
//!
//! - **Concurrent reads**: both files of a pair are hashed at the same time
//!   on a worker pool, so two storage devices are kept busy.
//!
//! - **SHA-256 / SHA-512**: streamed in bounded chunks, constant memory.
//!
//! - **Byte verification**: optional lockstep comparison of file content,
//!   independent of hashing.
//!
//! - **Crash-safe progress**: a JSON stats file is rewritten every few
//!   entries and at completion, for external monitoring.
//!
//! - **Partial failure tolerance**: unreadable files are recorded and the
//!   run continues; only configuration errors, unlistable directories and
//!   interrupts stop it.
//!
//! # Example
//!
//! ```bash
//! # Compare a migration
//! csum-walker /mnt/old /mnt/new
//!
//! # Stronger hash plus byte verification, custom stats file
//! csum-walker /mnt/old /mnt/new -c sha512 --verify -o /var/tmp/compare.json
//!
//! # Watch the stats from another terminal
//! csum-stats /var/tmp/compare.json --watch 2
//! ```

pub mod compare;
pub mod config;
pub mod content;
pub mod error;
pub mod progress;
pub mod stats;
pub mod walker;

pub use compare::{CompareReport, Comparator, ComparisonResult, SkipReason};
pub use config::{CliArgs, CompareConfig};
pub use content::{compute_digest, verify_equal, ChecksumAlgorithm};
pub use error::{CompareError, ConfigError, FileError, Result};
pub use stats::{load_stats, render_stats, RunStats, StatsWriter};
pub use walker::TreeWalker;
