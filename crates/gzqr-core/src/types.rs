use std::path::Path;

use crate::error::GzqrResult;

/// Raw archive payload plus the name it is restored under.
#[derive(Clone, PartialEq, Eq)]
pub struct PlaintextBlob {
    pub bytes: Vec<u8>,
    /// Base name without extension (e.g. `a` for `a.bin`)
    pub name: String,
    /// Extension including the leading dot, or empty
    pub ext: String,
}

impl PlaintextBlob {
    pub fn new(bytes: Vec<u8>, name: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            bytes,
            name: name.into(),
            ext: ext.into(),
        }
    }

    /// File name the blob is restored as: `name` followed by `ext`.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.name, self.ext)
    }
}

impl std::fmt::Debug for PlaintextBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaintextBlob")
            .field("name", &self.name)
            .field("ext", &self.ext)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Renders envelope text into symbol images and detects it back.
///
/// Implementations must round-trip any text for which `fits` returns true.
pub trait SymbolCodec: Send + Sync {
    /// Whether `text` fits inside a single symbol at the configured density.
    fn fits(&self, text: &str) -> bool;

    /// Render `text` as one symbol image at `path`.
    fn render(&self, text: &str, path: &Path) -> GzqrResult<()>;

    /// Detect the text of the symbol stored at `path`.
    ///
    /// `Ok(None)` means the image was readable but held no decodable symbol.
    fn detect(&self, path: &Path) -> GzqrResult<Option<String>>;
}
