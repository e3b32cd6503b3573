//! Run statistics and their persisted JSON form
//!
//! [`RunStats`] is owned by the comparison driver for the whole run. The
//! sink only ever serializes a snapshot of it.
//!
//! The JSON keys are those external monitors already read:
//!
//! ```json
//! {
//!   "timestarted": 1700000000,
//!   "timefinished": 1700000100,
//!   "filecount": 2,
//!   "errorcount": 0,
//!   "diffcount": 1,
//!   "skippedcount": 0,
//!   "bytescompared": 4,
//!   "errors": {},
//!   "difffiles": [{"oldpath": "...", "newpath": "...", "oldsum": "...", "newsum": "..."}],
//!   "oldroot": "/mnt/old",
//!   "newroot": "/mnt/new",
//!   "checksum": "sha256",
//!   "chunksize": 16777216,
//!   "verify": false
//! }
//! ```

pub mod display;
pub mod sink;

pub use display::render_stats;
pub use sink::{load_stats, StatsWriter};

use crate::compare::outcome::{ComparisonResult, EntryPaths};
use crate::config::CompareConfig;
use crate::content::checksum::ChecksumAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Digest placeholder for differences found by byte verification
pub const VERIFY_MARKER: &str = "verify";

/// One difference record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
    #[serde(rename = "oldpath")]
    pub old_path: String,

    #[serde(rename = "newpath")]
    pub new_path: String,

    #[serde(rename = "oldsum")]
    pub old_digest: String,

    #[serde(rename = "newsum")]
    pub new_digest: String,
}

impl DiffRecord {
    /// Whether this record comes from byte verification rather than hashing
    pub fn is_verify(&self) -> bool {
        self.old_digest == VERIFY_MARKER && self.new_digest == VERIFY_MARKER
    }
}

/// Aggregate state of one comparison run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Start time, epoch seconds
    #[serde(rename = "timestarted")]
    started_at: i64,

    /// Finish time, epoch seconds; absent while running
    #[serde(rename = "timefinished", default, skip_serializing_if = "Option::is_none")]
    finished_at: Option<i64>,

    /// Entries whose digests were compared
    #[serde(rename = "filecount")]
    processed: u64,

    #[serde(rename = "errorcount")]
    error_count: u64,

    /// Number of `difffiles` records (an entry may contribute two)
    #[serde(rename = "diffcount")]
    diff_count: u64,

    #[serde(rename = "skippedcount")]
    skipped: u64,

    /// Bytes hashed from the old tree
    #[serde(rename = "bytescompared", default)]
    bytes_compared: u64,

    /// Relative path -> [error kind, message]
    errors: BTreeMap<String, (String, String)>,

    #[serde(rename = "difffiles", default)]
    diff_files: Vec<DiffRecord>,

    #[serde(rename = "oldroot")]
    old_root: String,

    #[serde(rename = "newroot")]
    new_root: String,

    #[serde(rename = "checksum")]
    algorithm: ChecksumAlgorithm,

    #[serde(rename = "chunksize", default)]
    chunk_size: usize,

    #[serde(default)]
    verify: bool,
}

impl RunStats {
    /// Start a new run now
    pub fn new(config: &CompareConfig) -> Self {
        Self::started_at(config, chrono::Utc::now().timestamp())
    }

    /// Start a new run at an explicit epoch-seconds timestamp
    pub fn started_at(config: &CompareConfig, started_at: i64) -> Self {
        Self {
            started_at,
            finished_at: None,
            processed: 0,
            error_count: 0,
            diff_count: 0,
            skipped: 0,
            bytes_compared: 0,
            errors: BTreeMap::new(),
            diff_files: Vec::new(),
            old_root: config.old_root.display().to_string(),
            new_root: config.new_root.display().to_string(),
            algorithm: config.algorithm,
            chunk_size: config.chunk_size,
            verify: config.verify,
        }
    }

    /// Account for one entry; exactly one counter moves per call
    ///
    /// A difference found by both the digests and the byte check is one
    /// processed entry with two `difffiles` records.
    pub fn record(&mut self, paths: &EntryPaths, result: &ComparisonResult) {
        debug_assert!(self.finished_at.is_none(), "stats mutated after finish");

        match result {
            ComparisonResult::Identical => self.processed += 1,
            ComparisonResult::Different {
                old_digest,
                new_digest,
                verify_mismatch,
            } => {
                self.push_diff(paths, old_digest, new_digest);
                if *verify_mismatch {
                    self.push_diff(paths, VERIFY_MARKER, VERIFY_MARKER);
                }
                self.processed += 1;
            }
            ComparisonResult::VerifyMismatch => {
                self.push_diff(paths, VERIFY_MARKER, VERIFY_MARKER);
                self.processed += 1;
            }
            ComparisonResult::Skipped(_) => self.skipped += 1,
            ComparisonResult::Errored(err) => {
                self.errors
                    .insert(paths.relative.clone(), (err.kind_name(), err.to_string()));
                self.error_count += 1;
            }
        }
    }

    /// Add to the byte total
    pub fn add_bytes(&mut self, bytes: u64) {
        self.bytes_compared += bytes;
    }

    /// Mark the run complete
    pub fn finish(&mut self) {
        self.finish_at(chrono::Utc::now().timestamp());
    }

    /// Mark the run complete at an explicit timestamp
    pub fn finish_at(&mut self, finished_at: i64) {
        if self.finished_at.is_none() {
            self.finished_at = Some(finished_at);
        }
    }

    fn push_diff(&mut self, paths: &EntryPaths, old_digest: &str, new_digest: &str) {
        self.diff_files.push(DiffRecord {
            old_path: paths.old.display().to_string(),
            new_path: paths.new.display().to_string(),
            old_digest: old_digest.to_string(),
            new_digest: new_digest.to_string(),
        });
        self.diff_count = self.diff_files.len() as u64;
    }

    pub fn started(&self) -> i64 {
        self.started_at
    }

    pub fn finished(&self) -> Option<i64> {
        self.finished_at
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn diff_count(&self) -> u64 {
        self.diff_count
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn bytes_compared(&self) -> u64 {
        self.bytes_compared
    }

    pub fn errors(&self) -> &BTreeMap<String, (String, String)> {
        &self.errors
    }

    pub fn diff_files(&self) -> &[DiffRecord] {
        &self.diff_files
    }

    pub fn old_root(&self) -> &str {
        &self.old_root
    }

    pub fn new_root(&self) -> &str {
        &self.new_root
    }

    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn verify(&self) -> bool {
        self.verify
    }

    /// Entries accounted for so far (processed + errors + skipped)
    pub fn entries_seen(&self) -> u64 {
        self.processed + self.error_count + self.skipped
    }

    /// Run time up to `now` (or up to the finish time, once finished)
    pub fn elapsed(&self, now: i64) -> Duration {
        let end = self.finished_at.unwrap_or(now);
        Duration::from_secs(end.saturating_sub(self.started_at).max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::outcome::SkipReason;
    use crate::error::FileError;
    use std::io;
    use std::path::PathBuf;

    fn paths(rel: &str) -> EntryPaths {
        EntryPaths {
            old: PathBuf::from("/old").join(rel),
            new: PathBuf::from("/new").join(rel),
            relative: rel.to_string(),
        }
    }

    fn stats() -> RunStats {
        RunStats::started_at(&CompareConfig::new("/old", "/new").with_verify(true), 1_000)
    }

    #[test]
    fn test_each_outcome_moves_one_counter() {
        let mut s = stats();
        s.record(&paths("a"), &ComparisonResult::Identical);
        s.record(&paths("b"), &ComparisonResult::Skipped(SkipReason::NewMissing));
        s.record(
            &paths("c"),
            &ComparisonResult::Errored(FileError::io(
                "/old/c",
                io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            )),
        );

        assert_eq!(s.processed(), 1);
        assert_eq!(s.skipped(), 1);
        assert_eq!(s.error_count(), 1);
        assert_eq!(s.entries_seen(), 3);
        assert_eq!(s.errors()["c"].0, "PermissionDenied");
    }

    #[test]
    fn test_digest_and_verify_mismatch_recorded_separately() {
        let mut s = stats();
        s.record(
            &paths("x"),
            &ComparisonResult::Different {
                old_digest: "aa".into(),
                new_digest: "bb".into(),
                verify_mismatch: true,
            },
        );
        s.record(&paths("y"), &ComparisonResult::VerifyMismatch);

        assert_eq!(s.processed(), 2);
        assert_eq!(s.diff_files().len(), 3);
        assert_eq!(s.diff_count(), s.diff_files().len() as u64);
        assert!(!s.diff_files()[0].is_verify());
        assert!(s.diff_files()[1].is_verify());
        assert!(s.diff_files()[2].is_verify());
    }

    #[test]
    fn test_error_count_does_not_depend_on_keys() {
        let mut s = stats();
        s.record(&paths("same"), &ComparisonResult::Errored(FileError::WorkerLost));
        s.record(&paths("same"), &ComparisonResult::Errored(FileError::WorkerLost));

        assert_eq!(s.error_count(), 2);
        assert_eq!(s.entries_seen(), 2);
    }

    #[test]
    fn test_json_shape() {
        let mut s = stats();
        s.record(&paths("a"), &ComparisonResult::Identical);

        let running = serde_json::to_value(&s).unwrap();
        assert!(running.get("timefinished").is_none());
        assert_eq!(running["timestarted"], 1_000);
        assert_eq!(running["checksum"], "sha256");
        assert_eq!(running["filecount"], 1);
        assert_eq!(running["verify"], true);

        s.finish_at(1_060);
        let done = serde_json::to_value(&s).unwrap();
        assert_eq!(done["timefinished"], 1_060);
        assert_eq!(s.elapsed(5_000), Duration::from_secs(60));

        let back: RunStats = serde_json::from_value(done).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_error_entries_serialize_as_pairs() {
        let mut s = stats();
        s.record(&paths("bad"), &ComparisonResult::Errored(FileError::WorkerLost));
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["errors"]["bad"][0], "WorkerLost");
        assert!(v["errors"]["bad"][1].as_str().unwrap().contains("worker"));
    }
}
