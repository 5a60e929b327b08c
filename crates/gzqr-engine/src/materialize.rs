//! Turn an input path into a single plaintext blob

use std::path::Path;

use gzqr_core::{GzqrError, GzqrResult, PlaintextBlob};

/// Extension given to directory inputs, which are packed as tar.
pub const TAR_EXT: &str = ".tar";

/// Read a file as-is, or pack a directory tree into a tar archive.
///
/// Files keep their stem as `name` and their final extension (with the dot)
/// as `ext`; a file without an extension keeps its full name and an empty
/// `ext`. Directories use the directory name and [`TAR_EXT`].
pub fn materialize(path: &Path) -> GzqrResult<PlaintextBlob> {
    let meta = std::fs::metadata(path)
        .map_err(|e| GzqrError::Usage(format!("input {}: {e}", path.display())))?;

    if meta.is_dir() {
        let name = dir_name(path)?;
        let mut builder = tar::Builder::new(Vec::new());
        builder.append_dir_all(&name, path)?;
        let bytes = builder.into_inner()?;
        tracing::info!(dir = %path.display(), bytes = bytes.len(), "packed directory as tar");
        return Ok(PlaintextBlob::new(bytes, name, TAR_EXT));
    }

    let bytes = std::fs::read(path)?;
    let (name, ext) = split_file_name(path)?;
    tracing::debug!(file = %path.display(), bytes = bytes.len(), "read input file");
    Ok(PlaintextBlob::new(bytes, name, ext))
}

fn split_file_name(path: &Path) -> GzqrResult<(String, String)> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| GzqrError::Usage(format!("input {} has no file name", path.display())))?;

    match path.extension() {
        Some(ext) => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_name.clone());
            Ok((stem, format!(".{}", ext.to_string_lossy())))
        }
        None => Ok((file_name, String::new())),
    }
}

fn dir_name(path: &Path) -> GzqrResult<String> {
    let resolved = path.canonicalize()?;
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| GzqrError::Usage(format!("cannot archive {}", path.display())))
}
