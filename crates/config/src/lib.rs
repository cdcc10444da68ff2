//! Configuration for the Wei runtime
//!
//! JSON config at `~/.wei/config.json`: provider credentials, model and
//! turn-loop defaults, scoring caps, and session limits. Every field has
//! a serde default so a partial file keeps working across versions.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub mod paths;

pub use paths::{config_path, data_dir, sessions_dir};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config not found at {0}")]
    NotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// LLM endpoint credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// Turn-loop defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnDefaults {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_session_max_messages")]
    pub session_max_messages: usize,
}

impl Default for TurnDefaults {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_rounds: default_max_rounds(),
            request_timeout_secs: default_request_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            session_max_messages: default_session_max_messages(),
        }
    }
}

fn default_model() -> String {
    "anthropic/claude-sonnet-4".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_rounds() -> u32 {
    8
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_retry_attempts() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_session_max_messages() -> usize {
    100
}

/// Bonus caps, mirrored into the scoring engine at startup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_chain_cap")]
    pub chain_cap: u32,
    #[serde(default = "default_streak_cap")]
    pub streak_cap: u32,
    #[serde(default = "default_consistency_cap")]
    pub consistency_cap: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            chain_cap: default_chain_cap(),
            streak_cap: default_streak_cap(),
            consistency_cap: default_consistency_cap(),
        }
    }
}

fn default_chain_cap() -> u32 {
    3
}

fn default_streak_cap() -> u32 {
    5
}

fn default_consistency_cap() -> u32 {
    2
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub defaults: TurnDefaults,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl Config {
    /// Load from the default location.
    pub async fn load() -> Result<Self> {
        Self::load_from(&config_path()).await
    }

    /// Load from an explicit path.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = tokio::fs::read_to_string(path).await?;
        let config = serde_json::from_str(&content)?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load, or fall back to defaults when no file exists yet.
    pub async fn load_or_default() -> Self {
        match Self::load().await {
            Ok(config) => config,
            Err(e) => {
                debug!("using default config ({e})");
                Self::default()
            }
        }
    }

    pub async fn save(&self) -> Result<()> {
        self.save_to(&config_path()).await
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        info!("wrote config to {}", path.display());
        Ok(())
    }

    /// API key, with the `WEI_API_KEY` / `OPENROUTER_API_KEY` environment
    /// variables taking precedence over the file.
    pub fn api_key(&self) -> String {
        std::env::var("WEI_API_KEY")
            .or_else(|_| std::env::var("OPENROUTER_API_KEY"))
            .unwrap_or_else(|_| self.provider.api_key.clone())
    }

    pub fn is_provider_configured(&self) -> bool {
        !self.api_key().is_empty()
    }
}
