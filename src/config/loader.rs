//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/default.toml.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::adapters::ollama::OllamaConfig;
use crate::application::ProvisionPolicy;
use crate::domain::{ModelSpec, DEFAULT_HOST, DEFAULT_MODEL};

/// Environment variable overriding `backend.host`
pub const HOST_ENV: &str = "NEWSDESK_LLM_HOST";

/// Environment variable overriding `backend.model`
pub const MODEL_ENV: &str = "NEWSDESK_LLM_MODEL";

/// Main configuration structure matching config/default.toml
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendSection,
    #[serde(default)]
    pub provisioning: ProvisioningSection,
    #[serde(default)]
    pub news: NewsSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// LLM backend configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    /// Ollama base URL
    pub host: String,
    /// Default analysis model
    pub model: String,
    /// Timeout for liveness probes and model listing
    pub check_timeout_secs: u64,
    /// Timeout for a single generation request
    pub inference_timeout_secs: u64,
    /// Timeout for a model pull
    pub pull_timeout_secs: u64,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            check_timeout_secs: 5,
            inference_timeout_secs: 120,
            pull_timeout_secs: 1800,
        }
    }
}

impl BackendSection {
    /// Get host with environment variable override
    /// Checks NEWSDESK_LLM_HOST env var first, falls back to config value
    pub fn get_host(&self) -> String {
        std::env::var(HOST_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.host.clone())
    }

    /// Get model with environment variable override
    /// Checks NEWSDESK_LLM_MODEL env var first, falls back to config value
    pub fn get_model(&self) -> String {
        std::env::var(MODEL_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.model.clone())
    }

    /// Default model spec, env overrides applied
    pub fn model_spec(&self) -> ModelSpec {
        ModelSpec::new(self.get_model(), self.get_host())
    }
}

/// Model provisioning configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvisioningSection {
    /// Readiness checks after a pull (0 = trust the pull response)
    pub poll_attempts: u32,
    /// First delay between readiness checks
    pub poll_interval_ms: u64,
    /// Cap on the exponentially growing delay
    pub max_poll_interval_ms: u64,
}

impl Default for ProvisioningSection {
    fn default() -> Self {
        Self {
            poll_attempts: 10,
            poll_interval_ms: 2000,
            max_poll_interval_ms: 30_000,
        }
    }
}

/// News snapshot source section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsSection {
    /// Directory of YYYY-MM-DD.json snapshots (`~` is expanded)
    pub snapshot_dir: String,
}

impl Default for NewsSection {
    fn default() -> Self {
        Self {
            snapshot_dir: "data/news".to_string(),
        }
    }
}

impl NewsSection {
    pub fn snapshot_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.snapshot_dir).to_string())
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration, falling back to defaults when the file does not exist
pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        Ok(Config::default())
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = &self.backend.host;
        if !(host.starts_with("http://") || host.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "backend.host must be an http(s) URL, got '{}'",
                host
            )));
        }

        if self.backend.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.model cannot be empty".to_string(),
            ));
        }

        if self.backend.check_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "backend.check_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.backend.inference_timeout_secs < self.backend.check_timeout_secs {
            return Err(ConfigError::ValidationError(format!(
                "backend.inference_timeout_secs ({}) must be >= check_timeout_secs ({})",
                self.backend.inference_timeout_secs, self.backend.check_timeout_secs
            )));
        }

        if self.backend.pull_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "backend.pull_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.provisioning.max_poll_interval_ms < self.provisioning.poll_interval_ms {
            return Err(ConfigError::ValidationError(format!(
                "provisioning.max_poll_interval_ms ({}) must be >= poll_interval_ms ({})",
                self.provisioning.max_poll_interval_ms, self.provisioning.poll_interval_ms
            )));
        }

        if self.news.snapshot_dir.is_empty() {
            return Err(ConfigError::ValidationError(
                "news.snapshot_dir cannot be empty".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {:?}, got '{}'",
                LOG_LEVELS, self.logging.level
            )));
        }

        Ok(())
    }
}

// Conversions into runtime settings
impl From<&BackendSection> for OllamaConfig {
    fn from(section: &BackendSection) -> Self {
        OllamaConfig {
            check_timeout: Duration::from_secs(section.check_timeout_secs),
            inference_timeout: Duration::from_secs(section.inference_timeout_secs),
            pull_timeout: Duration::from_secs(section.pull_timeout_secs),
        }
    }
}

impl From<&ProvisioningSection> for ProvisionPolicy {
    fn from(section: &ProvisioningSection) -> Self {
        ProvisionPolicy {
            poll_attempts: section.poll_attempts,
            poll_interval: Duration::from_millis(section.poll_interval_ms),
            max_poll_interval: Duration::from_millis(section.max_poll_interval_ms),
        }
    }
}
