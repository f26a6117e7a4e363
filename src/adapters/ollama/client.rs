//! Ollama API Client
//!
//! HTTP client for a locally hosted Ollama server.
//! Handles liveness probes, model listing, model pulls and generation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};

use super::types::{GenerateBody, GenerateResponse, PullBody, PullProgress, TagsResponse};
use crate::ports::{
    BackendError, GenerateReply, GenerateRequest, LlmBackendPort, ModelEntry, ProvisionOutcome,
};

/// Ollama client configuration
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Timeout for liveness probes and model listing
    pub check_timeout: Duration,
    /// Timeout for a single generation request
    pub inference_timeout: Duration,
    /// Timeout for a model pull, including the streamed progress body
    pub pull_timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            check_timeout: Duration::from_secs(5),
            inference_timeout: Duration::from_secs(120),
            pull_timeout: Duration::from_secs(1800),
        }
    }
}

/// Ollama backend client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    config: OllamaConfig,
    http: Client,
}

impl OllamaClient {
    /// Create a new Ollama client with default configuration
    pub fn new() -> Result<Self, BackendError> {
        Self::with_config(OllamaConfig::default())
    }

    /// Create a new Ollama client with custom configuration
    pub fn with_config(config: OllamaConfig) -> Result<Self, BackendError> {
        // Per-request timeouts are applied in `send`; only connecting is bounded here
        let http = Client::builder()
            .connect_timeout(config.check_timeout)
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn url(host: &str, path: &str) -> String {
        format!("{}{}", host.trim_end_matches('/'), path)
    }

    /// Send with a deadline and reject non-success statuses
    async fn send(&self, req: RequestBuilder, timeout: Duration) -> Result<Response, BackendError> {
        let response = req
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn fetch_tags(&self, host: &str) -> Result<TagsResponse, BackendError> {
        let url = Self::url(host, "/api/tags");
        tracing::debug!(%url, "Listing models");

        let response = self.send(self.http.get(&url), self.config.check_timeout).await?;
        response
            .json::<TagsResponse>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

fn transport_error(e: reqwest::Error, timeout: Duration) -> BackendError {
    if e.is_timeout() {
        BackendError::Transport(format!("timed out after {:?}", timeout))
    } else {
        BackendError::Transport(e.to_string())
    }
}

#[async_trait]
impl LlmBackendPort for OllamaClient {
    async fn ping(&self, host: &str) -> Result<(), BackendError> {
        let url = Self::url(host, "/api/tags");
        tracing::debug!(%url, "Probing backend");

        self.send(self.http.get(&url), self.config.check_timeout)
            .await
            .map(|_| ())
    }

    async fn list_models(&self, host: &str) -> Result<Vec<ModelEntry>, BackendError> {
        Ok(self.fetch_tags(host).await?.models)
    }

    async fn pull_model(&self, host: &str, model: &str) -> Result<ProvisionOutcome, BackendError> {
        let url = Self::url(host, "/api/pull");
        tracing::info!(%url, model, "Requesting model pull");

        let req = self.http.post(&url).json(&PullBody { name: model });
        let response = self.send(req, self.config.pull_timeout).await?;

        // The backend streams progress records and reports failures in-band
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, self.config.pull_timeout))?;

        match PullProgress::scan(&body) {
            Ok(status) => {
                tracing::info!(model, status = status.as_deref().unwrap_or("none"), "Pull accepted");
                Ok(ProvisionOutcome::Accepted)
            }
            Err(error) => Err(BackendError::Status { status: 200, body: error }),
        }
    }

    async fn generate(
        &self,
        host: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateReply, BackendError> {
        let url = Self::url(host, "/api/generate");
        tracing::debug!(%url, model = %request.model, prompt_len = request.prompt.len(), "Sending generation request");

        let body = GenerateBody {
            model: &request.model,
            prompt: &request.prompt,
            stream: false,
            options: request.options,
        };

        let response = self
            .send(self.http.post(&url).json(&body), self.config.inference_timeout)
            .await?;

        let text = response
            .text()
            .await
            .map_err(|e| transport_error(e, self.config.inference_timeout))?;

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(parsed.into())
    }
}
