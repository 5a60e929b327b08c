pub mod config;
pub mod error;
pub mod types;

pub use error::{GzqrError, GzqrResult, MISSING_LISTED};
pub use types::{PlaintextBlob, SymbolCodec};
