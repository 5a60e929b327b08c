//! Capacity calibration
//!
//! Finds the largest raw payload whose fully serialized envelope still fits in
//! one symbol. The symbol capacity is an injected oracle so the search runs
//! without a real renderer. Probes use worst-case widths for every numeric
//! field, so the result stays valid however many chunks the archive grows to.
//! Hash fields are filled with letters, never digits, so a segmenting encoder
//! cannot pack the probe denser than a real envelope.

use gzqr_core::config::CalibrationConfig;
use gzqr_core::GzqrResult;

use crate::envelope::{ChunkEnvelope, GlobalMetadata, MAX_TOTAL};

const PROBE_INDEX: u64 = MAX_TOTAL - 1;
const PROBE_CHUNK_SIZE: u64 = 9_999_999;
const PROBE_HASH: &str = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";

// base64 of this cycle is "aaaa", which keeps QR segments in byte mode.
const PROBE_PATTERN: [u8; 3] = [0x69, 0xA6, 0x9A];

/// Binary-search calibrator for chunk payload size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibrator {
    /// Floor returned even when nothing larger fits
    pub min_chunk: usize,
    /// Subtracted from the largest fitting size
    pub safety_margin: usize,
    /// Upper end of the search range
    pub max_payload: usize,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::from(&CalibrationConfig::default())
    }
}

impl From<&CalibrationConfig> for Calibrator {
    fn from(cfg: &CalibrationConfig) -> Self {
        Self {
            min_chunk: cfg.min_chunk,
            safety_margin: cfg.safety_margin,
            max_payload: cfg.max_payload,
        }
    }
}

impl Calibrator {
    /// Largest fitting payload `D` in `0..=max_payload`, or `None` when even
    /// an empty payload does not fit. `fits` must be monotonic.
    pub fn search<F>(&self, mut fits: F) -> Option<usize>
    where
        F: FnMut(usize) -> bool,
    {
        let mut lo = 0usize;
        let mut hi = self.max_payload;
        let mut best = None;
        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            if fits(mid) {
                best = Some(mid);
                lo = mid + 1;
            } else if mid == 0 {
                break;
            } else {
                hi = mid - 1;
            }
        }
        best
    }

    /// Chunk size to use: `max(min_chunk, D - safety_margin)`.
    pub fn calibrate<F>(&self, fits: F) -> usize
    where
        F: FnMut(usize) -> bool,
    {
        let found = self.search(fits);
        let size = found
            .unwrap_or(0)
            .saturating_sub(self.safety_margin)
            .max(self.min_chunk);
        match found {
            Some(d) if d >= size => {
                tracing::debug!(capacity = d, chunk_size = size, "calibrated chunk size");
            }
            _ => {
                tracing::warn!(
                    capacity = ?found,
                    chunk_size = size,
                    "symbol capacity is below the minimum chunk size"
                );
            }
        }
        size
    }

    /// Calibrate against a text oracle using worst-case probe envelopes
    /// built from `template`.
    pub fn calibrate_envelope<F>(&self, template: &GlobalMetadata, fits: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        self.calibrate(|size| match probe_envelope(template, size) {
            Ok(text) => fits(&text),
            Err(e) => {
                tracing::debug!("probe envelope for {size} bytes failed: {e}");
                false
            }
        })
    }
}

/// Serialized worst-case envelope carrying `size` payload bytes.
///
/// Salt, nonce, KDF parameters, name and extension come from `template`;
/// index, total, chunk size and both hashes are replaced by their widest
/// plausible values.
pub fn probe_envelope(template: &GlobalMetadata, size: usize) -> GzqrResult<String> {
    let mut meta = template.clone();
    meta.total = MAX_TOTAL;
    meta.chunk_size = PROBE_CHUNK_SIZE;
    meta.cipher_hash = PROBE_HASH.to_string();

    let data: Vec<u8> = PROBE_PATTERN.iter().copied().cycle().take(size).collect();
    let mut env = ChunkEnvelope::new(PROBE_INDEX, data, meta);
    env.hash = PROBE_HASH.to_string();
    env.to_text()
}
