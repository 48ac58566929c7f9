//! # Content Hashing
//!
//! SHA-256 digests over raw content bytes. The digest is byte-exact: any
//! difference in content, including whitespace or encoding, changes it.

use sha2::{Digest as _, Sha256};
use shared_types::Digest;

/// Abstract interface for content digest computation.
///
/// The same implementation is used at upload time and at every later
/// verification, so recorded and recomputed digests are comparable.
pub trait ContentHasher: Send + Sync {
    /// Compute the digest of `bytes` as lowercase hex.
    fn digest(&self, bytes: &[u8]) -> Digest;
}

/// Default hasher using SHA-256.
#[derive(Default)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn digest(&self, bytes: &[u8]) -> Digest {
        sha256_digest(bytes)
    }
}

/// Hash content with SHA-256 (one-shot).
pub fn sha256_digest(bytes: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let out: [u8; 32] = hasher.finalize().into();
    Digest::from_bytes(&out)
}
