use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GzqrError, GzqrResult};

/// Top-level configuration (loaded from gzqr.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GzqrConfig {
    pub kdf: KdfConfig,
    pub symbol: SymbolConfig,
    pub calibration: CalibrationConfig,
    pub workers: WorkersConfig,
    pub log: LogConfig,
    pub secrets: SecretsConfig,
    pub output: OutputConfig,
}

impl GzqrConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> GzqrResult<Self> {
        if !path.exists() {
            tracing::debug!("config file not found: {} (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| GzqrError::Config(format!("parsing {}: {e}", path.display())))
    }
}

/// scrypt cost parameters used when encoding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfConfig {
    /// CPU/memory cost, must be a power of two (default: 32768)
    pub n: u64,
    /// Block size multiplier (default: 8)
    pub r: u32,
    /// Parallelism factor (default: 4)
    pub p: u32,
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self { n: 1 << 15, r: 8, p: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolConfig {
    /// QR error correction level: "L", "M", "Q" or "H" (default: M)
    pub ec_level: String,
    /// Largest QR version a symbol may use (1..=40, default: 40)
    pub max_version: i16,
    /// Quiet zone around each symbol, in modules (default: 4)
    pub margin: u32,
    /// Pixels per module in rendered images (default: 8)
    pub scale: u32,
}

impl Default for SymbolConfig {
    fn default() -> Self {
        Self {
            ec_level: "M".into(),
            max_version: 40,
            margin: 4,
            scale: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Floor for the calibrated chunk size in bytes (default: 64)
    pub min_chunk: usize,
    /// Bytes subtracted from the largest fitting payload (default: 16)
    pub safety_margin: usize,
    /// Upper bound of the payload search range in bytes (default: 4096)
    pub max_payload: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_chunk: 64,
            safety_margin: 16,
            max_payload: 4096,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    /// Worker thread count (0 = host concurrency)
    pub threads: usize,
}

impl WorkersConfig {
    pub fn resolve(&self) -> usize {
        if self.threads > 0 {
            self.threads
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    /// File holding a single password component
    pub passfile: Option<PathBuf>,
    /// Environment variable holding a single password component
    pub pass_env: String,
    /// Fixed number of interactive components (asked for when unset)
    pub components: Option<usize>,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            passfile: None,
            pass_env: "GZQR_PASS".into(),
            components: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default directory for rendered symbols
    pub symbols_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            symbols_dir: PathBuf::from("qrcodes"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[kdf]
n = 16384
r = 8
p = 2

[symbol]
ec_level = "Q"
max_version = 30
margin = 2
scale = 6

[calibration]
min_chunk = 128
safety_margin = 32
max_payload = 3000

[workers]
threads = 3

[log]
level = "debug"
format = "json"

[secrets]
passfile = "/run/secrets/gzqr"
pass_env = "MY_PASS"
components = 3

[output]
symbols_dir = "/tmp/symbols"
"#;
        let config: GzqrConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.kdf.n, 16384);
        assert_eq!(config.kdf.p, 2);
        assert_eq!(config.symbol.ec_level, "Q");
        assert_eq!(config.symbol.max_version, 30);
        assert_eq!(config.calibration.safety_margin, 32);
        assert_eq!(config.workers.resolve(), 3);
        assert_eq!(config.log.format, "json");
        assert_eq!(config.secrets.passfile, Some(PathBuf::from("/run/secrets/gzqr")));
        assert_eq!(config.secrets.components, Some(3));
        assert_eq!(config.output.symbols_dir, PathBuf::from("/tmp/symbols"));
    }

    #[test]
    fn test_parse_defaults() {
        let config: GzqrConfig = toml::from_str("").unwrap();

        assert_eq!(config.kdf.n, 32768);
        assert_eq!(config.kdf.r, 8);
        assert_eq!(config.kdf.p, 4);
        assert_eq!(config.symbol.ec_level, "M");
        assert_eq!(config.symbol.max_version, 40);
        assert_eq!(config.calibration.min_chunk, 64);
        assert_eq!(config.log.level, "info");
        assert_eq!(config.secrets.pass_env, "GZQR_PASS");
        assert!(config.secrets.passfile.is_none());
        assert!(config.workers.resolve() >= 1);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[symbol]
ec_level = "L"
"#;
        let config: GzqrConfig = toml::from_str(toml_str).unwrap();

        // Overridden
        assert_eq!(config.symbol.ec_level, "L");
        // Defaults
        assert_eq!(config.symbol.scale, 8);
        assert_eq!(config.kdf.n, 32768);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = GzqrConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: GzqrConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.kdf.n, parsed.kdf.n);
        assert_eq!(config.symbol.ec_level, parsed.symbol.ec_level);
        assert_eq!(config.output.symbols_dir, parsed.output.symbols_dir);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = GzqrConfig::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.kdf.r, 8);
    }

    #[test]
    fn test_load_invalid_file_is_config_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("gzqr.toml");
        std::fs::write(&path, "[kdf]\nn = \"lots\"\n").unwrap();
        let err = GzqrConfig::load(&path).unwrap_err();
        assert!(matches!(err, GzqrError::Config(_)));
    }
}
