//! Encode flow: plaintext blob → encrypted, chunked symbol images

use std::path::{Path, PathBuf};

use gzqr_chunks::{encode_chunks, file_id, Calibrator, GlobalMetadata, RunContext, PROTOCOL_VERSION};
use gzqr_core::config::GzqrConfig;
use gzqr_core::{GzqrResult, PlaintextBlob, SymbolCodec};
use gzqr_crypto::{
    derive_key, encrypt, generate_nonce, generate_salt, ArchiveAad, KdfParams, Passphrase,
    TAG_SIZE,
};

/// Tunables for one encode run.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeOptions {
    pub kdf: KdfParams,
    pub calibrator: Calibrator,
}

impl EncodeOptions {
    pub fn from_config(cfg: &GzqrConfig) -> Self {
        Self {
            kdf: KdfParams::new(cfg.kdf.n, cfg.kdf.r, cfg.kdf.p),
            calibrator: Calibrator::from(&cfg.calibration),
        }
    }
}

/// What an encode run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeReport {
    pub out_dir: PathBuf,
    pub file_id: String,
    pub total: u64,
    pub chunk_size: usize,
    pub ciphertext_len: usize,
}

/// File name of the symbol image for chunk `index`.
pub fn symbol_file_name(index: u64) -> String {
    format!("qr-{index:06}.png")
}

/// Encrypt `blob` and render one symbol per chunk into `out_dir`.
///
/// The chunk size is calibrated against `codec` before the key is derived,
/// so an unusable symbol configuration fails fast. Symbols are rendered into
/// a staging directory inside `out_dir` and moved into place only once every
/// chunk has rendered; a failed run leaves no symbols behind.
pub fn encode_archive(
    blob: &PlaintextBlob,
    password: &Passphrase,
    options: &EncodeOptions,
    codec: &dyn SymbolCodec,
    out_dir: &Path,
    ctx: &mut RunContext,
) -> GzqrResult<EncodeReport> {
    options.kdf.validate()?;
    std::fs::create_dir_all(out_dir)?;
    warn_on_existing_symbols(out_dir);

    let salt = generate_salt(&mut ctx.rng);
    let nonce = generate_nonce(&mut ctx.rng);
    let ciphertext_len = blob.bytes.len() + TAG_SIZE;

    let template = GlobalMetadata {
        salt,
        nonce,
        cipher_hash: String::new(),
        kdf: options.kdf,
        name: blob.name.clone(),
        ext: blob.ext.clone(),
        total: 0,
        chunk_size: 0,
    };
    let chunk_size = options
        .calibrator
        .calibrate_envelope(&template, |text| codec.fits(text));
    tracing::info!(chunk_size, "calibrated symbol payload");

    let key = derive_key(password, &salt, &options.kdf)?;
    let aad = ArchiveAad::new(PROTOCOL_VERSION, &blob.name, &blob.ext, options.kdf);
    let ciphertext = encrypt(&blob.bytes, &key, &nonce, &aad.to_bytes()?)?;
    debug_assert_eq!(ciphertext.len(), ciphertext_len);

    let meta = GlobalMetadata::for_ciphertext(
        &ciphertext,
        salt,
        nonce,
        options.kdf,
        &blob.name,
        &blob.ext,
        chunk_size,
    );

    let staging = tempfile::Builder::new()
        .prefix(".gzqr-staging-")
        .tempdir_in(out_dir)?;
    let total = encode_chunks(&ciphertext, &meta, ctx, |index, text| {
        codec.render(text, &staging.path().join(symbol_file_name(index)))
    })?;
    publish_symbols(staging.path(), out_dir, total)?;

    let report = EncodeReport {
        out_dir: out_dir.to_path_buf(),
        file_id: file_id(&blob.name),
        total,
        chunk_size,
        ciphertext_len,
    };
    tracing::info!(
        out_dir = %out_dir.display(),
        file_id = %report.file_id,
        total,
        "archive encoded"
    );
    Ok(report)
}

fn publish_symbols(staging: &Path, out_dir: &Path, total: u64) -> GzqrResult<()> {
    for index in 0..total {
        let name = symbol_file_name(index);
        std::fs::rename(staging.join(&name), out_dir.join(&name))?;
    }
    tracing::debug!(out_dir = %out_dir.display(), total, "symbols published");
    Ok(())
}

fn warn_on_existing_symbols(dir: &Path) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let existing = entries
        .filter_map(Result::ok)
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.starts_with("qr-") && name.ends_with(".png")
        })
        .count();
    if existing > 0 {
        tracing::warn!(
            dir = %dir.display(),
            existing,
            "output directory already holds symbol images; stale chunks will fail decoding"
        );
    }
}
