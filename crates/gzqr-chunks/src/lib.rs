//! gzqr-chunks: chunk envelopes, capacity calibration, parallel encode and reassembly
//!
//! # Overview
//! - `envelope`: the self-describing JSON record carried by every symbol
//! - `calibrate`: binary search for the largest payload one symbol can hold
//! - `encoder`: split ciphertext and build envelopes across a worker pool
//! - `reconstruct`: validate, deduplicate and reassemble scanned envelopes
//! - `context`: explicit per-run state (workers, RNG, progress callback)

pub mod calibrate;
pub mod context;
pub mod encoder;
pub mod envelope;
pub mod reconstruct;

pub use calibrate::{probe_envelope, Calibrator};
pub use context::{ProgressFn, RunContext};
pub use encoder::{encode_chunks, split};
pub use envelope::{
    file_id, ChunkEnvelope, GlobalMetadata, MAX_TOTAL, PROTOCOL_TYPE, PROTOCOL_VERSION,
};
pub use reconstruct::{reconstruct, Reconstruction, ScanStats};
