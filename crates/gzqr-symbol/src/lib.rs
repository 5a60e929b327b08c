//! gzqr-symbol: QR code rendering and detection behind [`SymbolCodec`]
//!
//! Envelope text is always encoded as a single byte-mode segment, so whether
//! it fits depends on its length alone and never on which characters happen
//! to appear in it. Symbols are rendered without the library quiet zone, then
//! padded with a white border of `margin` modules and written as PNG.
//! Detection accepts any raster format the `image` crate was built with (PNG,
//! JPEG).

use std::path::Path;

use gzqr_core::config::SymbolConfig;
use gzqr_core::{GzqrError, GzqrResult, SymbolCodec};
use image::{GrayImage, Luma};
use qrcode::bits::Bits;
use qrcode::types::QrResult;
use qrcode::{EcLevel, QrCode, Version};

/// QR code symbol codec.
#[derive(Debug, Clone, Copy)]
pub struct QrCodec {
    ec_level: EcLevel,
    max_version: i16,
    margin: u32,
    scale: u32,
}

impl QrCodec {
    pub fn from_config(cfg: &SymbolConfig) -> GzqrResult<Self> {
        let ec_level = parse_ec_level(&cfg.ec_level)?;
        if !(1..=40).contains(&cfg.max_version) {
            return Err(GzqrError::Config(format!(
                "symbol.max_version must be within 1..=40, got {}",
                cfg.max_version
            )));
        }
        if cfg.scale == 0 {
            return Err(GzqrError::Config("symbol.scale must be at least 1".into()));
        }
        Ok(Self {
            ec_level,
            max_version: cfg.max_version,
            margin: cfg.margin,
            scale: cfg.scale,
        })
    }

    /// Byte-mode bit stream for `text` at `version`, or an error when it
    /// does not fit.
    fn byte_bits(&self, text: &str, version: i16) -> QrResult<Bits> {
        let mut bits = Bits::new(Version::Normal(version));
        bits.push_byte_data(text.as_bytes())?;
        bits.push_terminator(self.ec_level)?;
        Ok(bits)
    }

    /// Smallest symbol up to `max_version` that holds `text`.
    fn encode(&self, text: &str) -> GzqrResult<QrCode> {
        let bits = (1..=self.max_version)
            .find_map(|v| self.byte_bits(text, v).ok())
            .ok_or_else(|| {
                GzqrError::Symbol(format!(
                    "{} bytes do not fit a QR code of version {} or below",
                    text.len(),
                    self.max_version
                ))
            })?;
        QrCode::with_bits(bits, self.ec_level)
            .map_err(|e| GzqrError::Symbol(format!("building QR code: {e}")))
    }
}

impl SymbolCodec for QrCodec {
    fn fits(&self, text: &str) -> bool {
        self.byte_bits(text, self.max_version).is_ok()
    }

    fn render(&self, text: &str, path: &Path) -> GzqrResult<()> {
        let code = self.encode(text)?;
        let symbol = code
            .render::<Luma<u8>>()
            .quiet_zone(false)
            .module_dimensions(self.scale, self.scale)
            .build();

        let border = self.margin * self.scale;
        let mut canvas = GrayImage::from_pixel(
            symbol.width() + 2 * border,
            symbol.height() + 2 * border,
            Luma([255u8]),
        );
        image::imageops::overlay(&mut canvas, &symbol, border as i64, border as i64);

        canvas
            .save(path)
            .map_err(|e| GzqrError::Symbol(format!("writing {}: {e}", path.display())))
    }

    fn detect(&self, path: &Path) -> GzqrResult<Option<String>> {
        let img = image::open(path)
            .map_err(|e| GzqrError::Symbol(format!("reading {}: {e}", path.display())))?
            .to_luma8();

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            img.width() as usize,
            img.height() as usize,
            |x, y| img.get_pixel(x as u32, y as u32).0[0],
        );
        for grid in prepared.detect_grids() {
            match grid.decode() {
                Ok((_, text)) => return Ok(Some(text)),
                Err(e) => tracing::debug!("{}: grid did not decode: {e}", path.display()),
            }
        }
        Ok(None)
    }
}

fn parse_ec_level(s: &str) -> GzqrResult<EcLevel> {
    match s.trim().to_ascii_uppercase().as_str() {
        "L" => Ok(EcLevel::L),
        "M" => Ok(EcLevel::M),
        "Q" => Ok(EcLevel::Q),
        "H" => Ok(EcLevel::H),
        other => Err(GzqrError::Config(format!(
            "symbol.ec_level must be one of L, M, Q, H, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> QrCodec {
        QrCodec::from_config(&SymbolConfig::default()).unwrap()
    }

    #[test]
    fn test_ec_level_parsing() {
        assert_eq!(parse_ec_level("m").unwrap(), EcLevel::M);
        assert_eq!(parse_ec_level(" H ").unwrap(), EcLevel::H);
        assert!(matches!(parse_ec_level("X"), Err(GzqrError::Config(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = SymbolConfig {
            max_version: 41,
            ..Default::default()
        };
        assert!(QrCodec::from_config(&cfg).is_err());

        let cfg = SymbolConfig {
            scale: 0,
            ..Default::default()
        };
        assert!(QrCodec::from_config(&cfg).is_err());
    }

    #[test]
    fn test_fits_respects_capacity() {
        let c = codec();
        assert!(c.fits("hello"));
        // QR v40-M holds 2331 bytes in byte mode
        assert!(c.fits(&"a".repeat(2331)));
        assert!(!c.fits(&"a".repeat(2332)));
    }

    #[test]
    fn test_fits_ignores_character_classes() {
        let c = codec();
        // digits and uppercase would pack denser in numeric/alphanumeric mode
        assert!(!c.fits(&"0".repeat(2332)));
        assert!(!c.fits(&"ABC123".repeat(389)));
        let hex = "0123456789abcdef".repeat(146);
        assert!(c.fits(&hex[..2331]));
        assert!(!c.fits(&hex[..2332]));
    }

    #[test]
    fn test_render_agrees_with_fits() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SymbolConfig {
            max_version: 5,
            scale: 1,
            ..Default::default()
        };
        let c = QrCodec::from_config(&cfg).unwrap();
        // v5-M byte capacity is 84
        let fitting = "9".repeat(84);
        assert!(c.fits(&fitting));
        c.render(&fitting, &dir.path().join("ok.png")).unwrap();

        let over = "9".repeat(85);
        assert!(!c.fits(&over));
        assert!(c.render(&over, &dir.path().join("over.png")).is_err());
    }

    #[test]
    fn test_fits_shrinks_with_max_version() {
        let cfg = SymbolConfig {
            max_version: 10,
            ..Default::default()
        };
        let c = QrCodec::from_config(&cfg).unwrap();
        assert!(c.fits(&"a".repeat(200)));
        assert!(!c.fits(&"a".repeat(400)));
    }

    #[test]
    fn test_render_rejects_oversized_text() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SymbolConfig {
            max_version: 5,
            ..Default::default()
        };
        let c = QrCodec::from_config(&cfg).unwrap();
        let err = c.render(&"a".repeat(500), &dir.path().join("big.png")).unwrap_err();
        assert!(matches!(err, GzqrError::Symbol(_)));
    }

    #[test]
    fn test_render_then_detect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qr-000000.png");
        let text = r#"{"chunk":0,"dataB64":"aGVsbG8gd29ybGQ=","type":"GitZipQR-CHUNK-ENC"}"#;

        codec().render(text, &path).unwrap();
        assert_eq!(codec().detect(&path).unwrap().as_deref(), Some(text));
    }

    #[test]
    fn test_margin_sets_border() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.png");
        let cfg = SymbolConfig {
            margin: 2,
            scale: 3,
            ..Default::default()
        };
        QrCodec::from_config(&cfg).unwrap().render("x", &path).unwrap();

        let img = image::open(&path).unwrap().to_luma8();
        // version 1 is 21 modules wide
        assert_eq!(img.width(), (21 + 2 * 2) * 3);
        assert_eq!(img.get_pixel(0, 0).0[0], 255);
        assert_eq!(img.get_pixel(6, 6).0[0], 0);
    }

    #[test]
    fn test_blank_image_has_no_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.png");
        GrayImage::from_pixel(64, 64, Luma([255u8])).save(&path).unwrap();
        assert_eq!(codec().detect(&path).unwrap(), None);
    }

    #[test]
    fn test_unreadable_image_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(codec().detect(&path), Err(GzqrError::Symbol(_))));
    }
}
