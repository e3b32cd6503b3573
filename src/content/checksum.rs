//! Streaming file checksums using the SHA-2 family
//!
//! Files are read sequentially in fixed-size chunks and fed into the running
//! hash state, so memory use is bounded by the chunk size regardless of file
//! size. Nothing is cached: every call reads from storage.
//!
//! Both algorithms share one read loop, generic over [`sha2::Digest`].

use crate::error::{ConfigError, FileError, FileResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

/// Smallest accepted read chunk
pub const MIN_CHUNK_SIZE: usize = 2048;

/// Default read chunk (16 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Largest accepted read chunk size
pub const MAX_CHUNK_SIZE: usize = 1 << 30;

/// Supported checksum algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    /// SHA-256 (256-bit digest)
    #[default]
    Sha256,
    /// SHA-512 (512-bit digest)
    Sha512,
}

impl ChecksumAlgorithm {
    /// Canonical lowercase name, as used on the command line and in the stats file
    pub fn name(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha256 => "sha256",
            ChecksumAlgorithm::Sha512 => "sha512",
        }
    }

    /// Length of the hex digest in characters
    pub fn hex_len(&self) -> usize {
        match self {
            ChecksumAlgorithm::Sha256 => 64,
            ChecksumAlgorithm::Sha512 => 128,
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(ChecksumAlgorithm::Sha256),
            "sha512" | "sha-512" => Ok(ChecksumAlgorithm::Sha512),
            _ => Err(ConfigError::UnsupportedAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

/// Compute the hex digest of a file
///
/// # Example
///
/// ```no_run
/// use csum_walker::content::checksum::{compute_digest, ChecksumAlgorithm, DEFAULT_CHUNK_SIZE};
///
/// let digest = compute_digest("/data/file.bin", ChecksumAlgorithm::Sha256, DEFAULT_CHUNK_SIZE)?;
/// assert_eq!(digest.len(), 64);
/// # Ok::<(), csum_walker::error::FileError>(())
/// ```
pub fn compute_digest<P: AsRef<Path>>(
    path: P,
    algorithm: ChecksumAlgorithm,
    chunk_size: usize,
) -> FileResult<String> {
    let never = AtomicBool::new(false);
    compute_digest_cancellable(path, algorithm, chunk_size, &never)
}

/// Compute the hex digest of a file, stopping early when `cancel` is set
///
/// The flag is checked between chunks; a set flag yields [`FileError::Cancelled`].
pub fn compute_digest_cancellable<P: AsRef<Path>>(
    path: P,
    algorithm: ChecksumAlgorithm,
    chunk_size: usize,
    cancel: &AtomicBool,
) -> FileResult<String> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| FileError::io(path, e))?;

    match digest_stream(file, algorithm, chunk_size, cancel) {
        Ok(digest) => Ok(digest),
        Err(StreamError::Cancelled) => Err(FileError::Cancelled),
        Err(StreamError::Io(e)) => Err(FileError::io(path, e)),
    }
}

/// Compute the hex digest of any reader
pub fn digest_reader<R: Read>(
    reader: R,
    algorithm: ChecksumAlgorithm,
    chunk_size: usize,
) -> io::Result<String> {
    let never = AtomicBool::new(false);
    match digest_stream(reader, algorithm, chunk_size, &never) {
        Ok(digest) => Ok(digest),
        Err(StreamError::Io(e)) => Err(e),
        Err(StreamError::Cancelled) => Err(io::Error::new(io::ErrorKind::Interrupted, "cancelled")),
    }
}

/// Format bytes as lowercase hex
pub fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

enum StreamError {
    Io(io::Error),
    Cancelled,
}

fn digest_stream<R: Read>(
    reader: R,
    algorithm: ChecksumAlgorithm,
    chunk_size: usize,
    cancel: &AtomicBool,
) -> Result<String, StreamError> {
    match algorithm {
        ChecksumAlgorithm::Sha256 => hash_chunks::<Sha256, R>(reader, chunk_size, cancel),
        ChecksumAlgorithm::Sha512 => hash_chunks::<Sha512, R>(reader, chunk_size, cancel),
    }
}

fn hash_chunks<D: Digest, R: Read>(
    mut reader: R,
    chunk_size: usize,
    cancel: &AtomicBool,
) -> Result<String, StreamError> {
    let mut hasher = D::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        if cancel.load(Ordering::Relaxed) {
            return Err(StreamError::Cancelled);
        }

        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(StreamError::Io(e)),
        };
        hasher.update(&buffer[..n]);
    }

    Ok(to_hex(&hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    // Well-known digests of "abc"
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
    const ABC_SHA512: &str = "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
                              2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f";

    #[test]
    fn test_known_vectors() {
        let d = digest_reader(Cursor::new(b"abc"), ChecksumAlgorithm::Sha256, MIN_CHUNK_SIZE).unwrap();
        assert_eq!(d, ABC_SHA256);

        let d = digest_reader(Cursor::new(b"abc"), ChecksumAlgorithm::Sha512, MIN_CHUNK_SIZE).unwrap();
        assert_eq!(d, ABC_SHA512);
    }

    #[test]
    fn test_chunk_size_does_not_change_digest() {
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();

        for algo in [ChecksumAlgorithm::Sha256, ChecksumAlgorithm::Sha512] {
            let small = digest_reader(Cursor::new(&data), algo, MIN_CHUNK_SIZE).unwrap();
            let odd = digest_reader(Cursor::new(&data), algo, 4099).unwrap();
            let large = digest_reader(Cursor::new(&data), algo, 1024 * 1024).unwrap();
            assert_eq!(small, odd);
            assert_eq!(small, large);
            assert_eq!(small.len(), algo.hex_len());
        }
    }

    #[test]
    fn test_empty_input() {
        let d = digest_reader(Cursor::new(b""), ChecksumAlgorithm::Sha256, MIN_CHUNK_SIZE).unwrap();
        assert_eq!(
            d,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("sha256".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Sha256);
        assert_eq!("SHA-512".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Sha512);
        assert!(matches!(
            "md5".parse::<ChecksumAlgorithm>(),
            Err(ConfigError::UnsupportedAlgorithm { .. })
        ));
        assert_eq!(ChecksumAlgorithm::default().to_string(), "sha256");
    }

    #[test]
    fn test_cancelled_before_first_chunk() {
        let cancel = AtomicBool::new(true);
        let result = digest_stream(Cursor::new(b"data"), ChecksumAlgorithm::Sha256, MIN_CHUNK_SIZE, &cancel);
        assert!(matches!(result, Err(StreamError::Cancelled)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = compute_digest("/nonexistent/csum-walker/file", ChecksumAlgorithm::Sha256, MIN_CHUNK_SIZE)
            .unwrap_err();
        assert_eq!(err.kind_name(), "NotFound");
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[0x00, 0xab, 0x0f]), "00ab0f");
    }
}
