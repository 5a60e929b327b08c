//! Password source discovery chain

use std::io::BufRead;
use std::path::{Path, PathBuf};

use gzqr_core::config::SecretsConfig;
use gzqr_core::{GzqrError, GzqrResult};
use gzqr_crypto::Passphrase;
use secrecy::SecretBox;
use zeroize::Zeroizing;

/// Environment variable naming a file that holds one password component.
pub const PASSFILE_ENV: &str = "GZQR_PASSFILE";

const DEFAULT_COMPONENTS: usize = 2;

/// Where password components come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordSource {
    /// Hidden-echo terminal prompt; `None` asks how many components first
    Prompt { components: Option<usize> },
    /// One component read from a file, trailing CR/LF stripped
    File(PathBuf),
    /// One component taken from the named environment variable
    Env(String),
}

/// Resolve the password source using the priority chain:
///   1. $GZQR_PASSFILE
///   2. secrets.passfile (from gzqr.toml)
///   3. the variable named by secrets.pass_env (default $GZQR_PASS), if non-empty
///   4. interactive prompt
pub fn resolve_source(config: &SecretsConfig) -> PasswordSource {
    resolve_source_with(config, |name| std::env::var(name).ok())
}

/// [`resolve_source`] with an injectable environment lookup.
pub fn resolve_source_with<F>(config: &SecretsConfig, env: F) -> PasswordSource
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = env(PASSFILE_ENV).filter(|p| !p.is_empty()) {
        tracing::debug!("password from ${PASSFILE_ENV}");
        return PasswordSource::File(PathBuf::from(path));
    }
    if let Some(path) = &config.passfile {
        tracing::debug!("password from config passfile {}", path.display());
        return PasswordSource::File(path.clone());
    }
    if !config.pass_env.is_empty() && env(&config.pass_env).is_some_and(|v| !v.is_empty()) {
        tracing::debug!("password from ${}", config.pass_env);
        return PasswordSource::Env(config.pass_env.clone());
    }
    PasswordSource::Prompt {
        components: config.components,
    }
}

/// Gather the raw password components from `source`.
pub fn collect_components(source: &PasswordSource) -> GzqrResult<Vec<Passphrase>> {
    match source {
        PasswordSource::File(path) => Ok(vec![read_passfile(path)?]),
        PasswordSource::Env(name) => {
            let value = Zeroizing::new(std::env::var(name).map_err(|_| {
                GzqrError::Secrets(format!("environment variable {name} is not set"))
            })?);
            Ok(vec![SecretBox::new(Box::new(value.as_bytes().to_vec()))])
        }
        PasswordSource::Prompt { components } => {
            let count = match components {
                Some(n) => (*n).max(1),
                None => ask_component_count()?,
            };
            (1..=count).map(prompt_component).collect()
        }
    }
}

/// Parse the answer to "how many components": 2 on bad input, never below 1.
pub fn parse_component_count(input: &str) -> usize {
    input
        .trim()
        .parse::<usize>()
        .map(|n| n.max(1))
        .unwrap_or(DEFAULT_COMPONENTS)
}

fn read_passfile(path: &Path) -> GzqrResult<Passphrase> {
    let mut bytes = std::fs::read(path).map_err(|e| {
        GzqrError::Secrets(format!("reading password file {}: {e}", path.display()))
    })?;
    while matches!(bytes.last(), Some(b'\n' | b'\r')) {
        bytes.pop();
    }
    Ok(SecretBox::new(Box::new(bytes)))
}

fn ask_component_count() -> GzqrResult<usize> {
    eprint!("Number of password components [{DEFAULT_COMPONENTS}]: ");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(parse_component_count(&line))
}

fn prompt_component(i: usize) -> GzqrResult<Passphrase> {
    let value = Zeroizing::new(
        rpassword::prompt_password(format!("Password component {i}: "))
            .map_err(|e| GzqrError::Secrets(format!("reading password: {e}")))?,
    );
    Ok(SecretBox::new(Box::new(value.as_bytes().to_vec())))
}
