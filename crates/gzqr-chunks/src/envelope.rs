//! Chunk envelope wire format
//!
//! Every symbol carries one envelope serialized as compact JSON with keys in
//! sorted order:
//! ```text
//! {"chunk":0,"chunkSize":1400,"cipherHash":"<hex>","dataB64":"...","ext":".bin",
//!  "fileId":"<16 hex>","hash":"<hex>","kdfParams":{"N":32768,"p":4,"r":8},
//!  "name":"a","nonceB64":"...","saltB64":"...","total":4,
//!  "type":"GitZipQR-CHUNK-ENC","version":"4.0-cpp-inline"}
//! ```
//! The archive-wide fields are replicated verbatim into every envelope, so any
//! single valid chunk is enough to recover them.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use gzqr_core::{GzqrError, GzqrResult};
use gzqr_crypto::{sha256_hex, KdfParams, NONCE_SIZE, SALT_SIZE};
use serde::{Deserialize, Serialize};

/// Protocol identifier carried in the `type` field.
pub const PROTOCOL_TYPE: &str = "GitZipQR-CHUNK-ENC";

/// Protocol version carried in the `version` field (also bound into the AAD).
pub const PROTOCOL_VERSION: &str = "4.0-cpp-inline";

/// Largest `total` an envelope may declare. Also the width calibration
/// reserves for the index and total fields.
pub const MAX_TOTAL: u64 = 999_999_999;

/// Short archive identifier: the first 16 hex chars of sha256(name).
pub fn file_id(name: &str) -> String {
    let mut hex = sha256_hex(name.as_bytes());
    hex.truncate(16);
    hex
}

/// Archive-wide metadata replicated into every envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalMetadata {
    pub salt: [u8; SALT_SIZE],
    pub nonce: [u8; NONCE_SIZE],
    /// Lowercase hex sha-256 of the complete ciphertext
    pub cipher_hash: String,
    pub kdf: KdfParams,
    pub name: String,
    pub ext: String,
    pub total: u64,
    /// Nominal raw payload per chunk; the last chunk may be shorter
    pub chunk_size: u64,
}

impl GlobalMetadata {
    /// Metadata for `ciphertext` cut into `chunk_size` pieces.
    #[allow(clippy::too_many_arguments)]
    pub fn for_ciphertext(
        ciphertext: &[u8],
        salt: [u8; SALT_SIZE],
        nonce: [u8; NONCE_SIZE],
        kdf: KdfParams,
        name: impl Into<String>,
        ext: impl Into<String>,
        chunk_size: usize,
    ) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            salt,
            nonce,
            cipher_hash: sha256_hex(ciphertext),
            kdf,
            name: name.into(),
            ext: ext.into(),
            total: ciphertext.len().div_ceil(chunk_size) as u64,
            chunk_size: chunk_size as u64,
        }
    }

    /// Name of the first global field that differs from `other`, if any.
    pub fn first_difference(&self, other: &GlobalMetadata) -> Option<&'static str> {
        if self.salt != other.salt {
            Some("saltB64")
        } else if self.nonce != other.nonce {
            Some("nonceB64")
        } else if !self.cipher_hash.eq_ignore_ascii_case(&other.cipher_hash) {
            Some("cipherHash")
        } else if self.kdf != other.kdf {
            Some("kdfParams")
        } else if self.name != other.name {
            Some("name")
        } else if self.ext != other.ext {
            Some("ext")
        } else if self.total != other.total {
            Some("total")
        } else if self.chunk_size != other.chunk_size {
            Some("chunkSize")
        } else {
            None
        }
    }
}

/// One chunk's payload plus the archive metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEnvelope {
    /// 0-based chunk index
    pub index: u64,
    /// Lowercase hex sha-256 of `data`
    pub hash: String,
    pub data: Vec<u8>,
    pub meta: GlobalMetadata,
}

// Field order is the wire key order.
#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    chunk: u64,
    #[serde(rename = "chunkSize")]
    chunk_size: u64,
    #[serde(rename = "cipherHash")]
    cipher_hash: String,
    #[serde(rename = "dataB64")]
    data_b64: String,
    ext: String,
    #[serde(rename = "fileId", default)]
    file_id: String,
    hash: String,
    #[serde(rename = "kdfParams")]
    kdf_params: KdfParams,
    name: String,
    #[serde(rename = "nonceB64")]
    nonce_b64: String,
    #[serde(rename = "saltB64")]
    salt_b64: String,
    total: u64,
    #[serde(rename = "type")]
    kind: String,
    version: String,
}

impl ChunkEnvelope {
    /// Build the envelope for chunk `index`, hashing `data`.
    pub fn new(index: u64, data: Vec<u8>, meta: GlobalMetadata) -> Self {
        Self {
            index,
            hash: sha256_hex(&data),
            data,
            meta,
        }
    }

    /// Canonical compact JSON text rendered into the symbol.
    pub fn to_text(&self) -> GzqrResult<String> {
        let wire = WireEnvelope {
            chunk: self.index,
            chunk_size: self.meta.chunk_size,
            cipher_hash: self.meta.cipher_hash.clone(),
            data_b64: B64.encode(&self.data),
            ext: self.meta.ext.clone(),
            file_id: file_id(&self.meta.name),
            hash: self.hash.clone(),
            kdf_params: self.meta.kdf,
            name: self.meta.name.clone(),
            nonce_b64: B64.encode(self.meta.nonce),
            salt_b64: B64.encode(self.meta.salt),
            total: self.meta.total,
            kind: PROTOCOL_TYPE.to_string(),
            version: PROTOCOL_VERSION.to_string(),
        };
        serde_json::to_string(&wire)
            .map_err(|e| GzqrError::Envelope(format!("serializing chunk {}: {e}", self.index)))
    }

    /// Parse envelope text and check its protocol tag.
    ///
    /// Text that is not an envelope at all yields [`GzqrError::Envelope`];
    /// an envelope of the wrong protocol or with undecodable fields yields
    /// [`GzqrError::ChunkValidation`]. The per-chunk hash is checked by
    /// [`ChunkEnvelope::verify`].
    pub fn from_text(text: &str) -> GzqrResult<Self> {
        let wire: WireEnvelope = serde_json::from_str(text)
            .map_err(|e| GzqrError::Envelope(format!("not a chunk envelope: {e}")))?;

        if wire.kind != PROTOCOL_TYPE {
            return Err(GzqrError::ChunkValidation(format!(
                "unexpected type '{}'",
                wire.kind
            )));
        }
        if wire.version != PROTOCOL_VERSION {
            return Err(GzqrError::ChunkValidation(format!(
                "unsupported version '{}'",
                wire.version
            )));
        }

        let data = B64
            .decode(wire.data_b64.as_bytes())
            .map_err(|e| GzqrError::ChunkValidation(format!("dataB64: {e}")))?;
        let salt = decode_fixed::<SALT_SIZE>("saltB64", &wire.salt_b64)?;
        let nonce = decode_fixed::<NONCE_SIZE>("nonceB64", &wire.nonce_b64)?;

        Ok(Self {
            index: wire.chunk,
            hash: wire.hash,
            data,
            meta: GlobalMetadata {
                salt,
                nonce,
                cipher_hash: wire.cipher_hash,
                kdf: wire.kdf_params,
                name: wire.name,
                ext: wire.ext,
                total: wire.total,
                chunk_size: wire.chunk_size,
            },
        })
    }

    /// Check the envelope on its own: payload hash, index range, payload size.
    pub fn verify(&self) -> GzqrResult<()> {
        if self.meta.total > MAX_TOTAL {
            return Err(GzqrError::ChunkValidation(format!(
                "total {} exceeds the limit of {MAX_TOTAL} chunks",
                self.meta.total
            )));
        }
        let actual = sha256_hex(&self.data);
        if !actual.eq_ignore_ascii_case(&self.hash) {
            return Err(GzqrError::ChunkValidation(format!(
                "chunk {} hash mismatch",
                self.index
            )));
        }
        if self.index >= self.meta.total {
            return Err(GzqrError::ChunkValidation(format!(
                "chunk index {} out of range for total {}",
                self.index, self.meta.total
            )));
        }
        if self.data.len() as u64 > self.meta.chunk_size {
            return Err(GzqrError::ChunkValidation(format!(
                "chunk {} carries {} bytes, chunkSize is {}",
                self.index,
                self.data.len(),
                self.meta.chunk_size
            )));
        }
        Ok(())
    }
}

fn decode_fixed<const N: usize>(field: &str, value: &str) -> GzqrResult<[u8; N]> {
    let bytes = B64
        .decode(value.as_bytes())
        .map_err(|e| GzqrError::ChunkValidation(format!("{field}: {e}")))?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        GzqrError::ChunkValidation(format!("{field}: expected {N} bytes, got {}", v.len()))
    })
}
