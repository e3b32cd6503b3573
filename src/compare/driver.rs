//! Comparison driver - walks the old tree and compares entry by entry
//!
//! The driver is responsible for:
//! - Mapping each walked path to its counterpart under the new root
//! - Skipping pairs where either side is not a regular file
//! - Hashing both files concurrently on the digest pool
//! - Optional byte verification
//! - Accounting every entry in [`RunStats`] and flushing snapshots
//!
//! Entries are processed one at a time: both digests of an entry are awaited
//! before the next entry starts. Per-file failures are recorded and the walk
//! goes on; traversal failures, stats write failures and interrupts end it.

use crate::compare::outcome::{path_key, ComparisonResult, EntryKind, EntryPaths, SkipReason};
use crate::compare::pool::DigestPool;
use crate::config::CompareConfig;
use crate::content::verify::verify_equal_cancellable;
use crate::error::{CompareError, FileError, FileResult, Result, TraversalError};
use crate::progress::{CompareProgress, ProgressSink};
use crate::stats::{RunStats, StatsWriter};
use crate::walker::TreeWalker;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of a completed run
#[derive(Debug)]
pub struct CompareReport {
    /// Final statistics (finish time set)
    pub stats: RunStats,

    /// Wall-clock duration
    pub duration: Duration,

    /// Where the stats were written
    pub stats_path: PathBuf,
}

/// Drives one comparison run
pub struct Comparator {
    /// Validated configuration
    config: CompareConfig,

    /// Digest workers
    pool: DigestPool,

    /// Stats file writer
    sink: StatsWriter,

    /// Shutdown signal
    shutdown: Arc<AtomicBool>,

    /// Optional live progress display
    progress: Option<Box<dyn ProgressSink>>,
}

impl Comparator {
    /// Validate `config` and start the digest pool
    ///
    /// Nothing is read or written when the configuration is rejected.
    pub fn new(config: CompareConfig) -> Result<Self> {
        config.validate()?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let pool = DigestPool::new(config.worker_count, Arc::clone(&shutdown))?;
        let sink = StatsWriter::new(&config.stats_path);

        Ok(Self {
            config,
            pool,
            sink,
            shutdown,
            progress: None,
        })
    }

    /// Attach a progress display
    pub fn with_progress(mut self, progress: impl ProgressSink + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Get a clone of the shutdown flag (for signal handlers)
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run the comparison to completion
    pub fn run(self) -> Result<CompareReport> {
        let start = Instant::now();
        let mut stats = RunStats::new(&self.config);

        info!(
            old = %self.config.old_root.display(),
            new = %self.config.new_root.display(),
            algorithm = %self.config.algorithm,
            verify = self.config.verify,
            chunk_size = self.config.chunk_size,
            "Starting comparison"
        );

        let outcome = self.walk(&mut stats, start);

        if let Some(ref p) = self.progress {
            match &outcome {
                Ok(()) => p.complete(),
                Err(CompareError::Interrupted) => p.abort("Comparison interrupted"),
                Err(_) => p.abort("Comparison failed"),
            }
        }

        if let Err(e) = outcome {
            // The last periodic snapshot stays the durable record
            if matches!(e, CompareError::Interrupted) {
                info!(processed = stats.processed(), "Comparison interrupted");
            }
            return Err(e);
        }

        stats.finish();
        self.sink.write(&stats)?;

        let duration = start.elapsed();
        info!(
            processed = stats.processed(),
            different = stats.diff_count(),
            skipped = stats.skipped(),
            errors = stats.error_count(),
            duration_secs = duration.as_secs(),
            "Comparison completed"
        );

        Ok(CompareReport {
            stats,
            duration,
            stats_path: self.sink.path().to_path_buf(),
        })
    }

    fn walk(&self, stats: &mut RunStats, start: Instant) -> Result<()> {
        let walker = TreeWalker::new(&self.config.old_root)?;
        let old_root = walker.root().to_path_buf();
        let mut seen: u64 = 0;

        for entry in walker {
            self.check_interrupt()?;
            let path = entry?;

            let (paths, result, bytes) = match self.entry_paths(&old_root, &path) {
                Ok(paths) => {
                    debug!(path = %paths.relative, "Testing");
                    let (result, bytes) = self.compare_paths(&paths)?;
                    (paths, result, bytes)
                }
                Err(e) => {
                    let paths = EntryPaths {
                        relative: path_key(&path),
                        new: path.clone(),
                        old: path,
                    };
                    (paths, ComparisonResult::Errored(e), 0)
                }
            };

            log_result(&paths, &result);
            stats.record(&paths, &result);
            stats.add_bytes(bytes);
            seen += 1;

            if let Some(ref p) = self.progress {
                p.update(&CompareProgress {
                    current: paths.relative.clone(),
                    seen,
                    processed: stats.processed(),
                    different: stats.diff_count(),
                    skipped: stats.skipped(),
                    errors: stats.error_count(),
                    bytes: stats.bytes_compared(),
                    elapsed: start.elapsed(),
                });
            }

            // Cadence follows entries seen, so skips and errors cannot stall it
            if seen % self.config.flush_every as u64 == 0 {
                self.sink.write(stats)?;
            }
        }

        self.check_interrupt()
    }

    /// Compare the entry at `path` (an absolute path under the old root)
    ///
    /// Per-file failures come back as [`ComparisonResult::Errored`]; only
    /// conditions that must end the run are `Err`.
    pub fn compare_entry<P: AsRef<Path>>(&self, path: P) -> Result<ComparisonResult> {
        let path = path.as_ref();
        let old_root =
            fs::canonicalize(&self.config.old_root).map_err(|source| TraversalError::Root {
                path: self.config.old_root.clone(),
                source,
            })?;

        match self.entry_paths(&old_root, path) {
            Ok(paths) => self.compare_paths(&paths).map(|(result, _)| result),
            Err(e) => Ok(ComparisonResult::Errored(e)),
        }
    }

    /// Map an old-tree path to its counterpart, keeping the relative path exactly
    fn entry_paths(&self, old_root: &Path, path: &Path) -> FileResult<EntryPaths> {
        let relative = path
            .strip_prefix(old_root)
            .map_err(|_| FileError::OutsideRoot {
                path: path.to_path_buf(),
                root: old_root.to_path_buf(),
            })?;

        Ok(EntryPaths::new(old_root, &self.config.new_root, relative))
    }

    /// Classify one pair, returning the outcome and the bytes hashed from the old side
    fn compare_paths(&self, paths: &EntryPaths) -> Result<(ComparisonResult, u64)> {
        let old_meta = match regular_file(&paths.old) {
            Ok(Presence::File(meta)) => meta,
            Ok(Presence::Missing) => return Ok(skipped(SkipReason::OldMissing)),
            Ok(Presence::Other(kind)) => return Ok(skipped(SkipReason::OldNotRegular(kind))),
            Err(e) => return Ok((ComparisonResult::Errored(e), 0)),
        };

        match regular_file(&paths.new) {
            Ok(Presence::File(_)) => {}
            Ok(Presence::Missing) => return Ok(skipped(SkipReason::NewMissing)),
            Ok(Presence::Other(kind)) => return Ok(skipped(SkipReason::NewNotRegular(kind))),
            Err(e) => return Ok((ComparisonResult::Errored(e), 0)),
        }

        let algorithm = self.config.algorithm;
        let chunk_size = self.config.chunk_size;

        // Both roots may sit on different devices; read them at the same time
        let old_pending = self.pool.submit(&paths.old, algorithm, chunk_size)?;
        let new_pending = self.pool.submit(&paths.new, algorithm, chunk_size)?;

        let old_digest = escalate(old_pending.wait())?;
        let new_digest = escalate(new_pending.wait())?;

        let (old_digest, new_digest) = match (old_digest, new_digest) {
            (Ok(old), Ok(new)) => (old, new),
            (Err(e), _) | (_, Err(e)) => return Ok((ComparisonResult::Errored(e), 0)),
        };

        let verify_mismatch = if self.config.verify {
            // Runs even when digests agree
            match escalate(verify_equal_cancellable(
                &paths.old,
                &paths.new,
                chunk_size,
                &self.shutdown,
            ))? {
                Ok(equal) => !equal,
                Err(e) => return Ok((ComparisonResult::Errored(e), 0)),
            }
        } else {
            false
        };

        let result = if old_digest != new_digest {
            ComparisonResult::Different {
                old_digest,
                new_digest,
                verify_mismatch,
            }
        } else if verify_mismatch {
            ComparisonResult::VerifyMismatch
        } else {
            ComparisonResult::Identical
        };

        Ok((result, old_meta.len()))
    }

    fn check_interrupt(&self) -> Result<()> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(CompareError::Interrupted);
        }
        Ok(())
    }
}

/// What sits at a path, without following symbolic links
enum Presence {
    File(Metadata),
    Missing,
    Other(EntryKind),
}

fn regular_file(path: &Path) -> FileResult<Presence> {
    match fs::symlink_metadata(path) {
        Ok(meta) => {
            let kind = EntryKind::from_file_type(meta.file_type());
            if kind.is_file() {
                Ok(Presence::File(meta))
            } else {
                Ok(Presence::Other(kind))
            }
        }
        Err(e) if is_missing(&e) => Ok(Presence::Missing),
        Err(e) => Err(FileError::io(path, e)),
    }
}

fn is_missing(err: &io::Error) -> bool {
    // NotADirectory: a parent component on that side is a file
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

fn skipped(reason: SkipReason) -> (ComparisonResult, u64) {
    (ComparisonResult::Skipped(reason), 0)
}

/// Lift a cancellation out of the per-file error space
fn escalate<T>(result: FileResult<T>) -> Result<FileResult<T>> {
    match result {
        Err(FileError::Cancelled) => Err(CompareError::Interrupted),
        other => Ok(other),
    }
}

fn log_result(paths: &EntryPaths, result: &ComparisonResult) {
    match result {
        ComparisonResult::Identical => {}
        ComparisonResult::Different {
            old_digest,
            new_digest,
            verify_mismatch,
        } => warn!(
            path = %paths.relative,
            old = %old_digest,
            new = %new_digest,
            verify_mismatch = verify_mismatch,
            "Files are NOT the same"
        ),
        ComparisonResult::VerifyMismatch => warn!(
            path = %paths.relative,
            "Files are NOT the same with byte verification"
        ),
        ComparisonResult::Skipped(reason) => debug!(
            path = %paths.relative,
            reason = %reason,
            "Skipping"
        ),
        ComparisonResult::Errored(e) => warn!(
            path = %paths.relative,
            error = %e,
            "Failed to compare"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::checksum::MIN_CHUNK_SIZE;
    use tempfile::{tempdir, TempDir};

    struct Trees {
        old: TempDir,
        new: TempDir,
        out: TempDir,
    }

    impl Trees {
        fn new() -> Self {
            Self {
                old: tempdir().unwrap(),
                new: tempdir().unwrap(),
                out: tempdir().unwrap(),
            }
        }

        fn config(&self) -> CompareConfig {
            CompareConfig::new(self.old.path(), self.new.path())
                .with_chunk_size(MIN_CHUNK_SIZE)
                .with_workers(2)
                .with_stats_path(self.out.path().join("output.json"))
        }
    }

    #[test]
    fn test_compare_entry_identical_and_different() {
        let t = Trees::new();
        fs::write(t.old.path().join("same"), b"X").unwrap();
        fs::write(t.new.path().join("same"), b"X").unwrap();
        fs::write(t.old.path().join("diff"), b"Y").unwrap();
        fs::write(t.new.path().join("diff"), b"Z").unwrap();

        let cmp = Comparator::new(t.config()).unwrap();
        let old_root = fs::canonicalize(t.old.path()).unwrap();

        assert!(matches!(
            cmp.compare_entry(old_root.join("same")).unwrap(),
            ComparisonResult::Identical
        ));
        assert!(matches!(
            cmp.compare_entry(old_root.join("diff")).unwrap(),
            ComparisonResult::Different { verify_mismatch: false, .. }
        ));
    }

    #[test]
    fn test_verify_runs_even_when_digests_differ() {
        let t = Trees::new();
        fs::write(t.old.path().join("f"), b"one").unwrap();
        fs::write(t.new.path().join("f"), b"two").unwrap();

        let cmp = Comparator::new(t.config().with_verify(true)).unwrap();
        let old_root = fs::canonicalize(t.old.path()).unwrap();

        assert!(matches!(
            cmp.compare_entry(old_root.join("f")).unwrap(),
            ComparisonResult::Different { verify_mismatch: true, .. }
        ));
    }

    #[test]
    fn test_missing_counterpart_is_skipped() {
        let t = Trees::new();
        fs::write(t.old.path().join("only-old"), b"data").unwrap();

        let cmp = Comparator::new(t.config()).unwrap();
        let old_root = fs::canonicalize(t.old.path()).unwrap();

        assert!(matches!(
            cmp.compare_entry(old_root.join("only-old")).unwrap(),
            ComparisonResult::Skipped(SkipReason::NewMissing)
        ));
    }

    #[test]
    fn test_counterpart_directory_is_skipped() {
        let t = Trees::new();
        fs::write(t.old.path().join("name"), b"data").unwrap();
        fs::create_dir(t.new.path().join("name")).unwrap();

        let cmp = Comparator::new(t.config()).unwrap();
        let old_root = fs::canonicalize(t.old.path()).unwrap();

        assert!(matches!(
            cmp.compare_entry(old_root.join("name")).unwrap(),
            ComparisonResult::Skipped(SkipReason::NewNotRegular(EntryKind::Directory))
        ));
    }

    #[test]
    fn test_path_outside_root_is_errored() {
        let t = Trees::new();
        let cmp = Comparator::new(t.config()).unwrap();

        assert!(matches!(
            cmp.compare_entry("/definitely/not/under/root").unwrap(),
            ComparisonResult::Errored(FileError::OutsideRoot { .. })
        ));
    }

    #[test]
    fn test_interrupt_before_first_entry() {
        let t = Trees::new();
        fs::write(t.old.path().join("a"), b"1").unwrap();
        fs::write(t.new.path().join("a"), b"1").unwrap();

        let config = t.config();
        let stats_path = config.stats_path.clone();
        let cmp = Comparator::new(config).unwrap();
        cmp.shutdown_flag().store(true, Ordering::SeqCst);

        assert!(matches!(cmp.run(), Err(CompareError::Interrupted)));
        assert!(!stats_path.exists());
    }

    #[test]
    fn test_escalate_only_lifts_cancellation() {
        assert!(matches!(
            escalate::<()>(Err(FileError::Cancelled)),
            Err(CompareError::Interrupted)
        ));
        assert!(matches!(
            escalate::<()>(Err(FileError::WorkerLost)),
            Ok(Err(FileError::WorkerLost))
        ));
    }
}
