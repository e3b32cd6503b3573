//! Byte-for-byte file verification
//!
//! Reads two files in lockstep and compares them chunk by chunk. This is
//! independent of hashing, so it also catches a wrong digest path. It always
//! reads both files in full when they are equal, which makes it the most
//! expensive check and therefore opt-in.

use crate::error::{FileError, FileResult};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Check whether two files have identical content
///
/// Returns `false` at the first differing chunk or when one file ends before
/// the other, `true` only when both reach end-of-file together.
pub fn verify_equal<A: AsRef<Path>, B: AsRef<Path>>(
    path_a: A,
    path_b: B,
    chunk_size: usize,
) -> FileResult<bool> {
    let never = AtomicBool::new(false);
    verify_equal_cancellable(path_a, path_b, chunk_size, &never)
}

/// Same as [`verify_equal`], checking `cancel` between chunks
pub fn verify_equal_cancellable<A: AsRef<Path>, B: AsRef<Path>>(
    path_a: A,
    path_b: B,
    chunk_size: usize,
    cancel: &AtomicBool,
) -> FileResult<bool> {
    let path_a = path_a.as_ref();
    let path_b = path_b.as_ref();

    let file_a = File::open(path_a).map_err(|e| FileError::io(path_a, e))?;
    let file_b = File::open(path_b).map_err(|e| FileError::io(path_b, e))?;

    match lockstep(file_a, file_b, chunk_size, cancel) {
        Ok(equal) => Ok(equal),
        Err(LockstepError::A(e)) => Err(FileError::io(path_a, e)),
        Err(LockstepError::B(e)) => Err(FileError::io(path_b, e)),
        Err(LockstepError::Cancelled) => Err(FileError::Cancelled),
    }
}

/// Compare two readers in lockstep
pub fn verify_readers<A: Read, B: Read>(a: A, b: B, chunk_size: usize) -> io::Result<bool> {
    let never = AtomicBool::new(false);
    match lockstep(a, b, chunk_size, &never) {
        Ok(equal) => Ok(equal),
        Err(LockstepError::A(e)) | Err(LockstepError::B(e)) => Err(e),
        Err(LockstepError::Cancelled) => {
            Err(io::Error::new(io::ErrorKind::Interrupted, "cancelled"))
        }
    }
}

/// Which side failed
enum LockstepError {
    A(io::Error),
    B(io::Error),
    Cancelled,
}

fn lockstep<A: Read, B: Read>(
    mut a: A,
    mut b: B,
    chunk_size: usize,
    cancel: &AtomicBool,
) -> Result<bool, LockstepError> {
    let mut buf_a = vec![0u8; chunk_size.max(1)];
    let mut buf_b = vec![0u8; chunk_size.max(1)];

    loop {
        if cancel.load(Ordering::Relaxed) {
            return Err(LockstepError::Cancelled);
        }

        let n_a = fill_chunk(&mut a, &mut buf_a).map_err(LockstepError::A)?;
        let n_b = fill_chunk(&mut b, &mut buf_b).map_err(LockstepError::B)?;

        match compare_chunks(&buf_a[..n_a], &buf_b[..n_b]) {
            ChunkOutcome::Equal => continue,
            ChunkOutcome::BothEnded => return Ok(true),
            ChunkOutcome::Mismatch => return Ok(false),
        }
    }
}

enum ChunkOutcome {
    Equal,
    BothEnded,
    Mismatch,
}

fn compare_chunks(a: &[u8], b: &[u8]) -> ChunkOutcome {
    if a.is_empty() && b.is_empty() {
        ChunkOutcome::BothEnded
    } else if a == b {
        ChunkOutcome::Equal
    } else {
        // Covers both differing bytes and one side hitting EOF early
        ChunkOutcome::Mismatch
    }
}

/// Read until `buf` is full or EOF, returning the number of bytes read
///
/// Two devices may return short reads at different points; filling whole
/// chunks keeps the comparison aligned on offsets.
fn fill_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
