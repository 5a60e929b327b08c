//! Key derivation: scrypt password → archive key

use gzqr_core::{GzqrError, GzqrResult};
use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{KEY_SIZE, SALT_SIZE};

/// Password bytes, possibly several NUL-joined components. Zeroized on drop.
pub type Passphrase = SecretBox<Vec<u8>>;

/// Largest scrypt working set we agree to allocate (512 MiB).
///
/// Decoding reads N/r/p from untrusted envelopes, so the ceiling is enforced
/// before any allocation happens.
pub const MAX_KDF_MEMORY: u64 = 512 * 1024 * 1024;

/// A 256-bit archive key derived from a password via scrypt.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct ArchiveKey {
    bytes: [u8; KEY_SIZE],
}

impl ArchiveKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for ArchiveKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for ArchiveKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// scrypt cost parameters, carried in every envelope as `kdfParams`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// CPU/memory cost (power of two)
    #[serde(rename = "N")]
    pub n: u64,
    /// Parallelism factor
    pub p: u32,
    /// Block size multiplier
    pub r: u32,
}

impl KdfParams {
    pub fn new(n: u64, r: u32, p: u32) -> Self {
        Self { n, p, r }
    }

    /// Approximate scrypt working set in bytes: `128·r·(N + p + 2)`.
    pub fn memory_bytes(&self) -> u128 {
        128u128 * self.r as u128 * (self.n as u128 + self.p as u128 + 2)
    }

    /// Reject parameters that are malformed or would exceed [`MAX_KDF_MEMORY`].
    pub fn validate(&self) -> GzqrResult<()> {
        if self.n < 2 || !self.n.is_power_of_two() {
            return Err(GzqrError::Kdf(format!(
                "N must be a power of two >= 2, got {}",
                self.n
            )));
        }
        if self.r == 0 || self.p == 0 {
            return Err(GzqrError::Kdf(format!(
                "r and p must be non-zero, got r={} p={}",
                self.r, self.p
            )));
        }
        let mem = self.memory_bytes();
        if mem > MAX_KDF_MEMORY as u128 {
            return Err(GzqrError::Kdf(format!(
                "parameters need {mem} bytes, ceiling is {MAX_KDF_MEMORY}"
            )));
        }
        Ok(())
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::new(1 << 15, 8, 4)
    }
}

/// Derive a 256-bit archive key from a password and salt using scrypt.
///
/// The salt is random per archive and travels in clear inside every envelope.
pub fn derive_key(
    password: &Passphrase,
    salt: &[u8; SALT_SIZE],
    params: &KdfParams,
) -> GzqrResult<ArchiveKey> {
    params.validate()?;

    let log_n = params.n.trailing_zeros() as u8;
    let scrypt_params = scrypt::Params::new(log_n, params.r, params.p, KEY_SIZE)
        .map_err(|e| GzqrError::Kdf(format!("invalid scrypt params: {e}")))?;

    tracing::debug!(n = params.n, r = params.r, p = params.p, "deriving archive key");

    let mut key = [0u8; KEY_SIZE];
    scrypt::scrypt(password.expose_secret(), salt, &scrypt_params, &mut key)
        .map_err(|e| GzqrError::Kdf(format!("scrypt failed: {e}")))?;

    Ok(ArchiveKey::from_bytes(key))
}
