//! SHA-256 helpers for per-chunk and whole-ciphertext integrity hashes

use sha2::{Digest, Sha256};

/// SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 digest of `data` as 64 lowercase hex chars.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}
