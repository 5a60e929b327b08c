//! gzqr: encrypted QR-code archiver
//!
//! Commands:
//!   encode <input> [<output_dir>]        - encrypt a file or directory into QR images
//!   decode <symbols_dir> [<output_dir>]  - restore the original from scanned QR images
//!   config show                          - display current configuration
//!
//! Exit status: 0 on success, 1 on any runtime failure, 2 on usage errors.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use gzqr_chunks::RunContext;
use gzqr_core::config::GzqrConfig;
use gzqr_core::GzqrError;
use gzqr_crypto::Passphrase;
use gzqr_engine::{decode_archive, encode_archive, materialize, write_output, EncodeOptions, TAR_EXT};
use gzqr_symbol::QrCodec;

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "gzqr",
    version,
    about = "Encrypted QR-code archiver",
    long_about = "gzqr: encrypt a file or directory into a set of QR code images, \
                  and restore it from any complete, unordered scan of them"
)]
struct Cli {
    /// Path to gzqr.toml configuration file
    #[arg(long, short = 'c', env = "GZQR_CONFIG", default_value = "gzqr.toml")]
    config: PathBuf,

    /// Worker threads (0 = host concurrency; overrides config)
    #[arg(long, short = 'j', env = "GZQR_WORKERS")]
    workers: Option<usize>,

    /// Log level filter (overrides config; RUST_LOG takes precedence)
    #[arg(long, env = "GZQR_LOG")]
    log_level: Option<String>,

    /// Log output format (overrides config)
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a file or directory into QR code images
    ///
    /// Directories are packed as tar first. The password is read from
    /// $GZQR_PASSFILE, the configured passfile, $GZQR_PASS, or prompted.
    Encode {
        /// File or directory to archive
        input: PathBuf,
        /// Directory for the QR images (default: symbols_dir from config)
        output_dir: Option<PathBuf>,
    },

    /// Restore the original file from a directory of QR images
    ///
    /// Images may be in any order, duplicated, or mixed with unrelated
    /// pictures; every chunk must be present.
    Decode {
        /// Directory holding the scanned QR images (.png, .jpg, .jpeg)
        symbols_dir: PathBuf,
        /// Where to write the restored file (default: current directory)
        output_dir: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file + flags)
    Show,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = GzqrConfig::load(&cli.config)
        .with_context(|| format!("loading config: {}", cli.config.display()))?;
    apply_overrides(&mut config, &cli);
    init_logging(&config.log.level, parse_log_format(&config.log.format));

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "gzqr starting"
    );

    match cli.command {
        Commands::Encode { input, output_dir } => {
            let out = output_dir.unwrap_or_else(|| config.output.symbols_dir.clone());
            cmd_encode(&config, &input, &out)
        }
        Commands::Decode { symbols_dir, output_dir } => {
            let out = output_dir.unwrap_or_else(|| PathBuf::from("."));
            cmd_decode(&config, &symbols_dir, &out)
        }
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &cli.config),
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<GzqrError>())
        .map(GzqrError::exit_code)
        .unwrap_or(1)
}

fn apply_overrides(config: &mut GzqrConfig, cli: &Cli) {
    if let Some(workers) = cli.workers {
        config.workers.threads = workers;
    }
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log.format = match format {
            LogFormat::Json => "json".into(),
            LogFormat::Text => "text".into(),
        };
    }
}

fn parse_log_format(s: &str) -> LogFormat {
    if s.eq_ignore_ascii_case("json") {
        LogFormat::Json
    } else {
        LogFormat::Text
    }
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────────

fn read_password(config: &GzqrConfig) -> Result<Passphrase> {
    let source = gzqr_secrets::resolve_source(&config.secrets);
    let parts = gzqr_secrets::collect_components(&source).context("reading password")?;
    Ok(gzqr_secrets::join_components(&parts)?)
}

fn make_progress_bar(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn run_context(config: &GzqrConfig, pb: &ProgressBar) -> RunContext {
    let bar = pb.clone();
    RunContext::new(config.workers.resolve()).with_progress(Box::new(move |done, total, phase| {
        bar.set_length(total);
        bar.set_position(done);
        bar.set_message(phase.to_string());
    }))
}

// ── `gzqr encode` ─────────────────────────────────────────────────────────────

fn cmd_encode(config: &GzqrConfig, input: &Path, out_dir: &Path) -> Result<()> {
    let codec = QrCodec::from_config(&config.symbol)?;
    let options = EncodeOptions::from_config(config);
    let blob = materialize(input)?;
    let password = read_password(config)?;

    let pb = make_progress_bar("encode");
    let mut ctx = run_context(config, &pb);
    let result = encode_archive(&blob, &password, &options, &codec, out_dir, &mut ctx);
    pb.finish_and_clear();
    let report = result.with_context(|| format!("encoding {}", input.display()))?;

    println!("Output directory: {}", report.out_dir.display());
    println!("File ID:          {}", report.file_id);
    println!("Chunks:           {}", report.total);
    println!("Chunk size:       {} bytes", report.chunk_size);
    Ok(())
}

// ── `gzqr decode` ─────────────────────────────────────────────────────────────

fn cmd_decode(config: &GzqrConfig, symbols_dir: &Path, out_dir: &Path) -> Result<()> {
    let codec = QrCodec::from_config(&config.symbol)?;

    let pb = make_progress_bar("scan");
    let ctx = run_context(config, &pb);
    let result = decode_archive(
        symbols_dir,
        || {
            pb.finish_and_clear();
            read_password(config).map_err(GzqrError::Other)
        },
        &codec,
        &ctx,
    );
    pb.finish_and_clear();
    let outcome = result.with_context(|| format!("decoding {}", symbols_dir.display()))?;

    tracing::info!(
        candidates = outcome.stats.candidates,
        accepted = outcome.stats.accepted,
        duplicates = outcome.stats.duplicates,
        "chunks verified"
    );

    let path = write_output(out_dir, &outcome.blob)?;
    println!("Restored: {}", path.display());
    if outcome.blob.ext == TAR_EXT {
        println!("Restored file is a tar archive; unpack with: tar -xf {}", path.display());
    }
    Ok(())
}

// ── `gzqr config show` ────────────────────────────────────────────────────────

fn cmd_config_show(config: &GzqrConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_usage_errors_exit_2() {
        let err = anyhow::Error::new(GzqrError::Usage("bad".into())).context("encoding x");
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_runtime_errors_exit_1() {
        let err = anyhow::Error::new(GzqrError::MissingChunks { total: 3, missing: vec![1], count: 1 });
        assert_eq!(exit_code(&err), 1);
        assert_eq!(exit_code(&anyhow::anyhow!("plain failure")), 1);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "gzqr", "--workers", "3", "--log-level", "debug", "--log-format", "json",
            "decode", "scans",
        ]);
        let mut config = GzqrConfig::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.workers.threads, 3);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, "json");
    }

    #[test]
    fn test_encode_output_dir_optional() {
        let cli = Cli::parse_from(["gzqr", "encode", "a.bin"]);
        match cli.command {
            Commands::Encode { input, output_dir } => {
                assert_eq!(input, PathBuf::from("a.bin"));
                assert!(output_dir.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_missing_argument_is_usage_error() {
        let err = Cli::try_parse_from(["gzqr", "decode"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
