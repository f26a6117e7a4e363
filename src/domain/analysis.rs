//! Analysis request/result types and the error taxonomy returned to callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default local Ollama endpoint
pub const DEFAULT_HOST: &str = "http://localhost:11434";

/// Default analysis model
pub const DEFAULT_MODEL: &str = "deepseek-r1:7b";

/// Model identifier plus the backend that serves it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub host: String,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into().trim_end_matches('/').to_string(),
        }
    }

    /// Same backend, different model
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: self.host.clone(),
        }
    }
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL, DEFAULT_HOST)
    }
}

/// Successful analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub text: String,
    pub model: String,
    pub date: String,
}

/// Coarse failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisErrorKind {
    BackendDown,
    ModelUnavailable,
    TransportFailure,
    EmptyResponse,
    InvalidSnapshot,
    NewsUnavailable,
}

/// Analysis failures, each carrying enough context for an operator to act on
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("LLM backend at {host} is not reachable: {reason} (is 'ollama serve' running?)")]
    BackendDown { host: String, reason: String },

    #[error("Model {model} is unavailable on {host}: {reason} (try: ollama pull {model})")]
    ModelUnavailable {
        model: String,
        host: String,
        reason: String,
    },

    #[error("Inference request to {host} failed: {reason}")]
    TransportFailure { host: String, reason: String },

    #[error("Model {model} returned no analysis: {reason}")]
    EmptyResponse { model: String, reason: String },

    #[error("Invalid news snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("No news snapshot for {date}: {reason}")]
    NewsUnavailable { date: String, reason: String },
}

impl AnalysisError {
    pub fn kind(&self) -> AnalysisErrorKind {
        match self {
            Self::BackendDown { .. } => AnalysisErrorKind::BackendDown,
            Self::ModelUnavailable { .. } => AnalysisErrorKind::ModelUnavailable,
            Self::TransportFailure { .. } => AnalysisErrorKind::TransportFailure,
            Self::EmptyResponse { .. } => AnalysisErrorKind::EmptyResponse,
            Self::InvalidSnapshot(_) => AnalysisErrorKind::InvalidSnapshot,
            Self::NewsUnavailable { .. } => AnalysisErrorKind::NewsUnavailable,
        }
    }

    /// Whether a caller may retry with backoff.
    ///
    /// A missing model needs operator intervention, and a malformed snapshot or
    /// payload will not change on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            AnalysisErrorKind::BackendDown | AnalysisErrorKind::TransportFailure
        )
    }
}
