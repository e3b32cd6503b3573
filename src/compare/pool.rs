//! Digest worker pool
//!
//! A fixed set of threads pulls digest jobs from a shared queue. Each job
//! carries its own reply channel, so the caller can submit the old and new
//! file of an entry and then wait on both. Workers only return values; they
//! never see the run statistics.
//!
//! ```text
//!   driver ──submit(old)──┐            ┌── digest-0 ──┐
//!          ──submit(new)──┼─▶ jobs ───▶├── digest-1 ──┼─▶ reply ─▶ wait()
//!                         │            └── digest-N ──┘
//! ```

use crate::content::checksum::{compute_digest_cancellable, ChecksumAlgorithm};
use crate::error::{FileError, FileResult, WorkerError};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// A digest request
struct DigestJob {
    path: PathBuf,
    algorithm: ChecksumAlgorithm,
    chunk_size: usize,
    reply: Sender<FileResult<String>>,
}

/// Result handle for a submitted digest
#[must_use = "a submitted digest must be waited on"]
pub struct PendingDigest {
    reply: Receiver<FileResult<String>>,
}

impl PendingDigest {
    /// Block until the digest is available
    pub fn wait(self) -> FileResult<String> {
        self.reply.recv().unwrap_or(Err(FileError::WorkerLost))
    }
}

/// Pool of threads computing file digests
pub struct DigestPool {
    /// Job queue (None once shut down)
    jobs: Option<Sender<DigestJob>>,

    /// Worker threads
    workers: Vec<JoinHandle<()>>,
}

impl DigestPool {
    /// Spawn `size` worker threads
    ///
    /// Workers stop reading mid-file when `cancel` is set.
    pub fn new(size: usize, cancel: Arc<AtomicBool>) -> Result<Self, WorkerError> {
        let (tx, rx) = unbounded::<DigestJob>();
        let mut workers = Vec::with_capacity(size);

        for id in 0..size {
            let rx = rx.clone();
            let cancel = Arc::clone(&cancel);

            let handle = thread::Builder::new()
                .name(format!("digest-{}", id))
                .spawn(move || worker_loop(id, rx, cancel))
                .map_err(|e| WorkerError::InitFailed {
                    id,
                    reason: e.to_string(),
                })?;
            workers.push(handle);
        }

        debug!(count = size, "Digest workers spawned");

        Ok(Self {
            jobs: Some(tx),
            workers,
        })
    }

    /// Number of worker threads
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queue a digest of `path`
    pub fn submit(
        &self,
        path: impl Into<PathBuf>,
        algorithm: ChecksumAlgorithm,
        chunk_size: usize,
    ) -> Result<PendingDigest, WorkerError> {
        let jobs = self.jobs.as_ref().ok_or(WorkerError::QueueClosed)?;
        let (reply_tx, reply_rx) = bounded(1);

        jobs.send(DigestJob {
            path: path.into(),
            algorithm,
            chunk_size,
            reply: reply_tx,
        })
        .map_err(|_| WorkerError::QueueClosed)?;

        Ok(PendingDigest { reply: reply_rx })
    }

    /// Close the queue and join all workers
    pub fn shutdown(mut self) -> Result<(), WorkerError> {
        self.join_all()
    }

    fn join_all(&mut self) -> Result<(), WorkerError> {
        // Closing the queue ends every worker loop
        self.jobs.take();

        let mut result = Ok(());
        for (id, handle) in std::mem::take(&mut self.workers).into_iter().enumerate() {
            if handle.join().is_err() {
                warn!(worker = id, "Digest worker panicked");
                result = Err(WorkerError::Panicked { id });
            }
        }
        result
    }
}

impl Drop for DigestPool {
    fn drop(&mut self) {
        let _ = self.join_all();
    }
}

fn worker_loop(id: usize, jobs: Receiver<DigestJob>, cancel: Arc<AtomicBool>) {
    for job in jobs.iter() {
        trace!(worker = id, path = %job.path.display(), "Hashing");
        let result = compute_digest_cancellable(&job.path, job.algorithm, job.chunk_size, &cancel);
        // The submitter may have given up already
        let _ = job.reply.send(result);
    }
    trace!(worker = id, "Digest worker exiting");
}
