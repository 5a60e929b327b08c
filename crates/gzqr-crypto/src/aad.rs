//! Canonical associated data for the archive cipher
//!
//! Wire contract, byte-exact on both sides:
//! ```text
//! {"N":<n>,"ext":"<ext>","name":"<name>","p":<p>,"r":<r>,"version":"<version>"}
//! ```
//! Compact JSON, keys in byte-wise sorted order, integers in plain decimal,
//! strings escaped as serde_json escapes them, UTF-8 encoded.

use gzqr_core::{GzqrError, GzqrResult};
use serde::Serialize;

use crate::kdf::KdfParams;

/// Public archive metadata authenticated (not encrypted) by the cipher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveAad {
    pub version: String,
    pub name: String,
    pub ext: String,
    pub kdf: KdfParams,
}

// Field order here is the canonical key order.
#[derive(Serialize)]
struct CanonicalAad<'a> {
    #[serde(rename = "N")]
    n: u64,
    ext: &'a str,
    name: &'a str,
    p: u32,
    r: u32,
    version: &'a str,
}

impl ArchiveAad {
    pub fn new(
        version: impl Into<String>,
        name: impl Into<String>,
        ext: impl Into<String>,
        kdf: KdfParams,
    ) -> Self {
        Self {
            version: version.into(),
            name: name.into(),
            ext: ext.into(),
            kdf,
        }
    }

    /// Canonical byte encoding fed to the AEAD.
    pub fn to_bytes(&self) -> GzqrResult<Vec<u8>> {
        let canonical = CanonicalAad {
            n: self.kdf.n,
            ext: &self.ext,
            name: &self.name,
            p: self.kdf.p,
            r: self.kdf.r,
            version: &self.version,
        };
        serde_json::to_vec(&canonical)
            .map_err(|e| GzqrError::Other(anyhow::anyhow!("serializing associated data: {e}")))
    }
}
