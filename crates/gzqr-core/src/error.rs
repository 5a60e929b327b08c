use thiserror::Error;

pub type GzqrResult<T> = Result<T, GzqrError>;

/// Most indices a [`GzqrError::MissingChunks`] carries.
pub const MISSING_LISTED: usize = 1024;

#[derive(Debug, Error)]
pub enum GzqrError {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("key derivation error: {0}")]
    Kdf(String),

    /// Wrong password and tampered ciphertext are deliberately indistinguishable.
    #[error("authentication failed: wrong password or corrupted archive")]
    Authentication,

    #[error("chunk rejected: {0}")]
    ChunkValidation(String),

    /// `missing` lists the lowest missing indices, at most
    /// [`MISSING_LISTED`] of them; `count` is the full number missing.
    #[error("missing {count} of {total} chunks: {}", format_indices(missing, *count))]
    MissingChunks {
        total: u64,
        missing: Vec<u64>,
        count: u64,
    },

    #[error("no valid chunk found among {candidates} candidates")]
    NoValidChunks { candidates: usize },

    #[error("global integrity check failed: expected cipherHash {expected}, got {actual}")]
    GlobalIntegrity { expected: String, actual: String },

    #[error("chunk {index} belongs to a different archive: field '{field}' differs")]
    MetadataMismatch { index: u64, field: &'static str },

    #[error("envelope error: {0}")]
    Envelope(String),

    #[error("symbol codec error: {0}")]
    Symbol(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("secrets error: {0}")]
    Secrets(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GzqrError {
    /// Process exit status for this error: 2 for bad invocation, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            GzqrError::Usage(_) => 2,
            _ => 1,
        }
    }
}

fn format_indices(indices: &[u64], count: u64) -> String {
    const SHOWN: usize = 32;
    let shown = indices.len().min(SHOWN);
    let mut out = indices[..shown]
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if count > shown as u64 {
        out.push_str(&format!(", ... ({} more)", count - shown as u64));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(GzqrError::Usage("bad".into()).exit_code(), 2);
        assert_eq!(GzqrError::Authentication.exit_code(), 1);
        assert_eq!(
            GzqrError::MissingChunks { total: 3, missing: vec![1], count: 1 }.exit_code(),
            1
        );
    }

    #[test]
    fn test_missing_chunks_message_lists_indices() {
        let err = GzqrError::MissingChunks { total: 10, missing: vec![2, 7], count: 2 };
        assert_eq!(err.to_string(), "missing 2 of 10 chunks: 2, 7");
    }

    #[test]
    fn test_missing_chunks_message_truncates() {
        let missing: Vec<u64> = (0..40).collect();
        let msg = GzqrError::MissingChunks { total: 40, missing, count: 40 }.to_string();
        assert!(msg.ends_with("... (8 more)"), "got: {msg}");
    }

    #[test]
    fn test_missing_chunks_message_uses_full_count() {
        let missing: Vec<u64> = (1..=MISSING_LISTED as u64).collect();
        let msg = GzqrError::MissingChunks { total: 1_000_000, missing, count: 999_999 }.to_string();
        assert!(msg.starts_with("missing 999999 of 1000000 chunks: 1, 2, 3"), "got: {msg}");
        assert!(msg.ends_with("... (999967 more)"), "got: {msg}");
    }
}
