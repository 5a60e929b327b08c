//! Decode flow: symbol images → verified ciphertext → plaintext blob

use std::path::{Path, PathBuf};

use gzqr_chunks::{reconstruct, RunContext, ScanStats, PROTOCOL_VERSION};
use gzqr_core::{GzqrError, GzqrResult, PlaintextBlob, SymbolCodec};
use gzqr_crypto::{decrypt, derive_key, ArchiveAad, Passphrase};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Result of a successful decode; nothing has been written yet.
#[derive(Debug)]
pub struct DecodeOutcome {
    pub blob: PlaintextBlob,
    pub stats: ScanStats,
    pub total: u64,
}

/// Regular files in `dir` with a png/jpg/jpeg extension, sorted by path.
pub fn collect_candidates(dir: &Path) -> GzqrResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(GzqrError::Usage(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()));
        if is_image && path.is_file() {
            candidates.push(path);
        }
    }
    candidates.sort();

    if candidates.is_empty() {
        return Err(GzqrError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no symbol images found in {}", dir.display()),
        )));
    }
    tracing::debug!(dir = %dir.display(), count = candidates.len(), "collected candidates");
    Ok(candidates)
}

/// Scan `dir`, reassemble and verify the ciphertext, then decrypt it.
///
/// `password` is only called once the scan has produced a complete,
/// globally verified ciphertext, so a broken symbol set never prompts.
pub fn decode_archive<P>(
    dir: &Path,
    password: P,
    codec: &dyn SymbolCodec,
    ctx: &RunContext,
) -> GzqrResult<DecodeOutcome>
where
    P: FnOnce() -> GzqrResult<Passphrase>,
{
    let candidates = collect_candidates(dir)?;
    let rec = reconstruct(&candidates, |path: &PathBuf| codec.detect(path), ctx)?;
    let meta = rec.meta;
    meta.kdf.validate()?;

    let password = password()?;
    let key = derive_key(&password, &meta.salt, &meta.kdf)?;
    let aad = ArchiveAad::new(PROTOCOL_VERSION, &meta.name, &meta.ext, meta.kdf);
    let plaintext = decrypt(&rec.ciphertext, &key, &meta.nonce, &aad.to_bytes()?)?;

    tracing::info!(
        name = %meta.name,
        ext = %meta.ext,
        bytes = plaintext.len(),
        "archive decrypted"
    );
    Ok(DecodeOutcome {
        blob: PlaintextBlob::new(plaintext, meta.name, meta.ext),
        stats: rec.stats,
        total: meta.total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_filter() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["qr-000001.png", "b.JPG", "c.jpeg", "notes.txt", "noext"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let names: Vec<String> = collect_candidates(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["b.JPG", "c.jpeg", "qr-000001.png"]);
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.md"), b"").unwrap();
        let err = collect_candidates(dir.path()).unwrap_err();
        assert!(matches!(err, GzqrError::Io(_)));
        assert!(err.to_string().contains("no symbol images found"));
    }

    #[test]
    fn test_missing_directory_is_usage_error() {
        let err = collect_candidates(Path::new("/nonexistent/gzqr-scan")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
