//! Content comparison module
//!
//! This module provides functions for:
//! - Computing SHA-256 / SHA-512 file digests in bounded-size chunks
//! - Verifying two files byte-for-byte

pub mod checksum;
pub mod verify;

pub use checksum::{
    compute_digest, ChecksumAlgorithm, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE,
};
pub use verify::verify_equal;
