//! Error types for csum-walker
//!
//! This module defines the error hierarchy for a comparison run:
//! - Configuration errors (bad algorithm, chunk size below the floor)
//! - Traversal errors (a directory under the old root cannot be listed)
//! - Per-file errors (recorded against a relative path, never fatal)
//! - Stats file errors
//! - Digest pool errors
//!
//! Design philosophy:
//! - Fatal conditions are `CompareError`; per-file conditions are `FileError`
//! - Errors carry the path they concern

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for a comparison run
#[derive(Error, Debug)]
pub enum CompareError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The old tree could not be fully enumerated
    #[error("Traversal error: {0}")]
    Traversal(#[from] TraversalError),

    /// Stats file errors
    #[error("Stats error: {0}")]
    Stats(#[from] StatsError),

    /// Digest pool errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Interrupted by signal
    #[error("Operation interrupted by signal")]
    Interrupted,
}

/// Configuration and CLI errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Checksum algorithm is not one of the supported ones
    #[error("Unsupported checksum algorithm '{name}': sha256 and sha512 are the only supported algorithms")]
    UnsupportedAlgorithm { name: String },

    /// Chunk size below the enforced floor
    #[error("Chunk size {size} is too small: must be at least {min} bytes")]
    ChunkSizeTooSmall { size: usize, min: usize },

    /// Chunk size above what two read buffers per worker can afford
    #[error("Chunk size {size} is too large: must be at most {max} bytes")]
    ChunkSizeTooLarge { size: usize, max: usize },

    /// Chunk size could not be parsed
    #[error("Invalid chunk size '{value}': {reason}")]
    InvalidChunkSize { value: String, reason: String },

    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 2 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid flush cadence
    #[error("Invalid flush interval {every}: must be at least 1")]
    InvalidFlushInterval { every: usize },

    /// One of the roots is unusable
    #[error("Invalid root '{path}': {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    /// Stats output path error
    #[error("Invalid stats output path '{path}': {reason}")]
    InvalidStatsPath { path: PathBuf, reason: String },
}

/// Errors that abort the walk of the old tree
#[derive(Error, Debug)]
pub enum TraversalError {
    /// The root itself could not be resolved
    #[error("Failed to resolve root '{path}': {source}")]
    Root { path: PathBuf, source: io::Error },

    /// A directory could not be listed
    #[error("Failed to read directory '{path}': {source}")]
    ReadDir { path: PathBuf, source: io::Error },

    /// An entry of a directory listing could not be read
    #[error("Failed to read entry in '{path}': {source}")]
    Entry { path: PathBuf, source: io::Error },
}

/// Errors scoped to a single file pair
///
/// These are recorded in the stats file and the run continues, except for
/// `Cancelled` which the driver turns into [`CompareError::Interrupted`].
#[derive(Error, Debug)]
pub enum FileError {
    /// I/O failure while opening, stating or reading a file
    #[error("{path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    /// The entry could not be expressed relative to the old root
    #[error("'{path}' is not under root '{root}'")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// The run was cancelled while this file was being read
    #[error("Cancelled")]
    Cancelled,

    /// A digest worker went away without replying
    #[error("Digest worker terminated without a result")]
    WorkerLost,
}

impl FileError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FileError::Io {
            path: path.into(),
            source,
        }
    }

    /// Name of the error kind, as persisted in the stats file
    pub fn kind_name(&self) -> String {
        match self {
            FileError::Io { source, .. } => format!("{:?}", source.kind()),
            FileError::OutsideRoot { .. } => "OutsideRoot".to_string(),
            FileError::Cancelled => "Cancelled".to_string(),
            FileError::WorkerLost => "WorkerLost".to_string(),
        }
    }

    /// Check if this error means the whole run must stop
    pub fn is_cancellation(&self) -> bool {
        matches!(self, FileError::Cancelled)
    }
}

/// Stats file errors
#[derive(Error, Debug)]
pub enum StatsError {
    /// Failed to write the stats file
    #[error("Failed to write stats file '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    /// Failed to serialize the stats
    #[error("Failed to encode stats: {0}")]
    Encode(#[from] serde_json::Error),

    /// Failed to read the stats file
    #[error("Failed to read stats file '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    /// The stats file is not valid JSON (possibly mid-write)
    #[error("Failed to decode stats file '{path}': {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl StatsError {
    /// Check if a reader should retry (file missing or caught mid-write)
    pub fn is_transient(&self) -> bool {
        matches!(self, StatsError::Decode { .. } | StatsError::Read { .. })
    }
}

/// Digest pool errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {id} panicked")]
    Panicked { id: usize },

    /// Worker initialization failed
    #[error("Failed to initialize worker {id}: {reason}")]
    InitFailed { id: usize, reason: String },

    /// Job queue closed
    #[error("Digest job queue closed unexpectedly")]
    QueueClosed,
}

/// Result type alias for CompareError
pub type Result<T> = std::result::Result<T, CompareError>;

/// Result type alias for FileError
pub type FileResult<T> = std::result::Result<T, FileError>;
