//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use tracing::Level;
use url::Url;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Always ends with `/api`, never with a trailing slash.
    pub api_url: Url,
    pub state_dir: PathBuf,
    pub log_level: Level,
}

/// Drops one trailing `/` and appends `/api` unless it is already there.
pub fn normalize_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| {
        ConfigError::InvalidValue("TASKBOARD_API_URL".to_string(), format!("'{raw}': {reason}"))
    };

    let trimmed = raw.trim();
    let base = trimmed.strip_suffix('/').unwrap_or(trimmed);
    let normalized = if base.ends_with("/api") {
        base.to_string()
    } else {
        format!("{base}/api")
    };

    let url = Url::parse(&normalized).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("only http and https are supported".to_string()));
    }
    Ok(url)
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = normalize_api_url(
            &lookup("TASKBOARD_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        )?;

        let state_dir = lookup("TASKBOARD_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./.taskboard"));

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            api_url,
            state_dir,
            log_level,
        })
    }
}
