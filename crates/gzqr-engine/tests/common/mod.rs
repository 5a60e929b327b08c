//! Shared fixtures: an in-memory text "symbol codec" and quick KDF settings.

#![allow(dead_code)]

use std::path::Path;

use gzqr_chunks::{Calibrator, RunContext};
use gzqr_core::{GzqrResult, SymbolCodec};
use gzqr_crypto::{KdfParams, Passphrase};
use gzqr_engine::EncodeOptions;
use secrecy::SecretBox;

/// Byte capacity of a QR version 40 symbol at error correction M.
pub const QR_V40_M_BYTES: usize = 2331;

/// Stores envelope text verbatim in the image file.
///
/// `fits` is a plain length check; `detect` returns `None` for files that are
/// not valid UTF-8 so binary noise behaves like an image with no symbol.
pub struct TextCodec {
    pub capacity: usize,
}

impl TextCodec {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl SymbolCodec for TextCodec {
    fn fits(&self, text: &str) -> bool {
        text.len() <= self.capacity
    }

    fn render(&self, text: &str, path: &Path) -> GzqrResult<()> {
        std::fs::write(path, text)?;
        Ok(())
    }

    fn detect(&self, path: &Path) -> GzqrResult<Option<String>> {
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8(bytes).ok())
    }
}

pub fn password(s: &str) -> Passphrase {
    SecretBox::new(Box::new(s.as_bytes().to_vec()))
}

/// Cheap KDF cost so tests stay fast.
pub fn fast_options() -> EncodeOptions {
    EncodeOptions {
        kdf: KdfParams::new(1 << 10, 8, 1),
        calibrator: Calibrator::default(),
    }
}

pub fn ctx() -> RunContext {
    RunContext::seeded(4, 0x5eed)
}

pub fn symbol_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|e| e == "png"))
        .collect();
    files.sort();
    files
}
