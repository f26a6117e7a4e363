//! LLM backend port
//!
//! Every operation takes the backend host explicitly so a single adapter can
//! serve concurrent calls aimed at different backends and models.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed sampling temperature for analysis requests
pub const ANALYSIS_TEMPERATURE: f64 = 0.7;

/// Fixed nucleus-sampling cutoff for analysis requests
pub const ANALYSIS_TOP_P: f64 = 0.9;

/// Backend call failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// Connection refused, DNS failure, timeout, etc.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// A model the backend has available locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

impl ModelEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
            modified_at: None,
        }
    }

    /// Substring/identifier match, so `deepseek-r1` matches `deepseek-r1:7b`.
    /// A blank name matches nothing.
    pub fn matches(&self, model: &str) -> bool {
        !model.trim().is_empty() && self.name.contains(model)
    }
}

/// Outcome of a provisioning request the backend accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Download started or finished; readiness must still be polled
    Accepted,
}

/// Sampling options sent with a generation request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingOptions {
    pub temperature: f64,
    pub top_p: f64,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: ANALYSIS_TEMPERATURE,
            top_p: ANALYSIS_TOP_P,
        }
    }
}

/// Single non-streaming generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub options: SamplingOptions,
}

/// Generation reply; `response` is `None` when the payload lacked it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerateReply {
    pub response: Option<String>,
    /// Tokens generated, when the backend reports it
    pub eval_count: Option<u64>,
    /// Wall time in nanoseconds, when the backend reports it
    pub total_duration: Option<u64>,
}

/// Port for an Ollama-style inference server
#[async_trait]
pub trait LlmBackendPort: Send + Sync {
    /// Lightweight liveness probe
    async fn ping(&self, host: &str) -> Result<(), BackendError>;

    /// Models resident on the backend
    async fn list_models(&self, host: &str) -> Result<Vec<ModelEntry>, BackendError>;

    /// Ask the backend to fetch a model
    async fn pull_model(&self, host: &str, model: &str) -> Result<ProvisionOutcome, BackendError>;

    /// Run one generation
    async fn generate(&self, host: &str, request: &GenerateRequest)
        -> Result<GenerateReply, BackendError>;
}
