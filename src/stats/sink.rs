//! Stats file persistence
//!
//! Every flush rewrites the whole file. The JSON is first written to a
//! hidden sibling and renamed over the target, so readers see either the
//! previous snapshot or the new one. Readers should still retry on a decode
//! failure, since some filesystems do not make rename atomic.

use crate::error::StatsError;
use crate::stats::RunStats;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Writes [`RunStats`] snapshots to a fixed path
#[derive(Debug, Clone)]
pub struct StatsWriter {
    path: PathBuf,
    temp_path: PathBuf,
}

impl StatsWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stats.json".to_string());
        let temp_path = path.with_file_name(format!(".{}.tmp", name));
        Self { path, temp_path }
    }

    /// Target path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the stats file with a snapshot of `stats`
    pub fn write(&self, stats: &RunStats) -> Result<(), StatsError> {
        let json = serde_json::to_vec_pretty(stats)?;

        fs::write(&self.temp_path, &json).map_err(|source| StatsError::Write {
            path: self.temp_path.clone(),
            source,
        })?;

        fs::rename(&self.temp_path, &self.path).map_err(|source| StatsError::Write {
            path: self.path.clone(),
            source,
        })?;

        trace!(
            path = %self.path.display(),
            processed = stats.processed(),
            "Stats flushed"
        );
        Ok(())
    }
}

/// Read a stats file back
pub fn load_stats<P: AsRef<Path>>(path: P) -> Result<RunStats, StatsError> {
    let path = path.as_ref();
    let content = fs::read(path).map_err(|source| StatsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_slice(&content).map_err(|source| StatsError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
