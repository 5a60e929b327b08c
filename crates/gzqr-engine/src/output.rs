//! Atomic output writing

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use gzqr_core::{GzqrError, GzqrResult, PlaintextBlob};

/// Write `blob` into `out_dir` as `name + ext`.
///
/// Bytes go to a temp file in the same directory which is then renamed over
/// the target, so a failed run never leaves a partial file behind.
pub fn write_output(out_dir: &Path, blob: &PlaintextBlob) -> GzqrResult<PathBuf> {
    let file_name = blob.file_name();
    check_file_name(&file_name)?;

    std::fs::create_dir_all(out_dir)?;
    let target = out_dir.join(&file_name);

    let mut tmp = tempfile::Builder::new()
        .prefix(".gzqr-")
        .suffix(".part")
        .tempfile_in(out_dir)?;
    tmp.write_all(&blob.bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| GzqrError::Io(e.error))?;

    tracing::info!(path = %target.display(), bytes = blob.bytes.len(), "output written");
    Ok(target)
}

// Archive names come from untrusted envelopes.
fn check_file_name(name: &str) -> GzqrResult<()> {
    let mut components = Path::new(name).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_normal || name.contains(['/', '\\']) {
        return Err(GzqrError::Envelope(format!(
            "refusing to write archive name '{name}' outside the output directory"
        )));
    }
    Ok(())
}
