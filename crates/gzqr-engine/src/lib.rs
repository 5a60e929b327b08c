//! gzqr-engine: encode and decode flows
//!
//! Encode: input path → [`materialize`] → [`encode_archive`] → symbol images.
//! Decode: symbol images → [`decode_archive`] → [`write_output`].

pub mod decode;
pub mod encode;
pub mod materialize;
pub mod output;

pub use decode::{collect_candidates, decode_archive, DecodeOutcome};
pub use encode::{encode_archive, symbol_file_name, EncodeOptions, EncodeReport};
pub use materialize::{materialize, TAR_EXT};
pub use output::write_output;
