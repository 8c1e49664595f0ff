//! sha256 hashing, used for capability hashes and the revocation-hash set.

use sha2::{Digest, Sha256};

/// Compute the 32-byte sha256 digest of `bytes`.
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}
