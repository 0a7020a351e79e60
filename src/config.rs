//! Runtime configuration from the environment
//!
//! The API credential is looked up in three places, first hit wins:
//! 1. a mounted secrets file (`CAREER_SECRETS_FILE`, default
//!    `/run/secrets/deepseek_api_key`)
//! 2. the `DEEPSEEK_API_KEY` environment variable
//! 3. a `.env` file in the working directory (development only)

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CareerError, Result};
use crate::types::CompletionConfig;

/// Name of the credential in the environment and in `.env`
pub const API_KEY_VAR: &str = "DEEPSEEK_API_KEY";

/// Default location of the hosted secret
pub const DEFAULT_SECRETS_FILE: &str = "/run/secrets/deepseek_api_key";

/// Where each credential source lives
#[derive(Debug, Clone)]
pub struct CredentialSources {
    pub secrets_file: PathBuf,
    pub env_value: Option<String>,
    pub dotenv_file: PathBuf,
}

impl CredentialSources {
    /// Sources as seen by the current process
    pub fn from_env() -> Self {
        Self {
            secrets_file: std::env::var("CAREER_SECRETS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SECRETS_FILE)),
            env_value: std::env::var(API_KEY_VAR).ok(),
            dotenv_file: PathBuf::from(".env"),
        }
    }

    /// Resolve the API key, or fail with a configuration error
    pub fn resolve(&self) -> Result<String> {
        if let Some(key) = read_secret_file(&self.secrets_file) {
            debug!("API key loaded from secrets file");
            return Ok(key);
        }
        if let Some(key) = self.env_value.as_deref().and_then(non_empty) {
            debug!("API key loaded from environment");
            return Ok(key);
        }
        if let Some(key) = read_dotenv_value(&self.dotenv_file, API_KEY_VAR) {
            debug!("API key loaded from .env");
            return Ok(key);
        }
        Err(CareerError::Config(format!(
            "{} not found: set it in the environment, a .env file, or {}",
            API_KEY_VAR,
            self.secrets_file.display()
        )))
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn read_secret_file(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().as_deref().and_then(non_empty)
}

/// Look up `key` in a `KEY=VALUE` file. Blank lines, `#` comments, an
/// optional `export ` prefix and surrounding quotes are handled.
pub fn read_dotenv_value(path: &Path, key: &str) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    content.lines().find_map(|line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let (name, value) = line.split_once('=')?;
        if name.trim() != key {
            return None;
        }
        let value = value.trim();
        let unquoted = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
            .unwrap_or(value);
        non_empty(unquoted)
    })
}

impl CompletionConfig {
    /// Resolve the credential and read optional overrides from the environment
    pub fn from_env() -> Result<Self> {
        let api_key = CredentialSources::from_env().resolve()?;
        let mut config = CompletionConfig::new(api_key);

        if let Ok(base) = std::env::var("CAREER_API_BASE") {
            config.base_url = base;
        }
        if let Ok(model) = std::env::var("CAREER_MODEL") {
            config.model = model;
        }
        if let Ok(raw) = std::env::var("CAREER_TEMPERATURE") {
            config.temperature = raw.parse().map_err(|_| {
                CareerError::Config(format!("CAREER_TEMPERATURE is not a number: {}", raw))
            })?;
        }
        if let Ok(raw) = std::env::var("CAREER_TIMEOUT_SECS") {
            config.timeout_secs = raw.parse().map_err(|_| {
                CareerError::Config(format!("CAREER_TIMEOUT_SECS is not a number: {}", raw))
            })?;
        }
        Ok(config)
    }
}
