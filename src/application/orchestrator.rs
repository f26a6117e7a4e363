//! Analysis Orchestrator
//!
//! Turns a news snapshot and an optional focus query into one inference call:
//! backend check, model check/pull, prompt, generate, normalize.
//! The model is chosen per call, so one orchestrator can be shared across
//! concurrent requests aimed at different models.

use std::sync::Arc;

use crate::domain::{analysis_prompt, AnalysisError, AnalysisResult, ModelSpec, NewsSnapshot};
use crate::ports::{
    BackendError, GenerateRequest, LlmBackendPort, NewsSourcePort, SamplingOptions,
};

use super::guard::{BackendStatus, ModelAvailabilityGuard, ModelStatus, ProvisionPolicy};

/// Coordinates readiness checks, prompt building and generation
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    backend: Arc<dyn LlmBackendPort>,
    guard: ModelAvailabilityGuard,
    default_model: ModelSpec,
}

impl AnalysisOrchestrator {
    /// Create new orchestrator
    pub fn new(backend: Arc<dyn LlmBackendPort>, default_model: ModelSpec) -> Self {
        let guard = ModelAvailabilityGuard::new(Arc::clone(&backend));
        Self {
            backend,
            guard,
            default_model,
        }
    }

    /// Set custom provisioning policy
    pub fn with_provision_policy(mut self, policy: ProvisionPolicy) -> Self {
        self.guard = ModelAvailabilityGuard::with_policy(Arc::clone(&self.backend), policy);
        self
    }

    pub fn default_model(&self) -> &ModelSpec {
        &self.default_model
    }

    pub fn guard(&self) -> &ModelAvailabilityGuard {
        &self.guard
    }

    /// Analyze with the default model
    pub async fn analyze(
        &self,
        snapshot: &NewsSnapshot,
        query: Option<&str>,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_with(snapshot, query, &self.default_model).await
    }

    /// Fetch a snapshot (latest when `date` is `None`) and analyze it
    pub async fn analyze_from_source(
        &self,
        source: &dyn NewsSourcePort,
        date: Option<&str>,
        query: Option<&str>,
        model: &ModelSpec,
    ) -> Result<AnalysisResult, AnalysisError> {
        let fetched = match date {
            Some(date) => source.by_date(date).await,
            None => source.latest().await,
        };

        let snapshot = fetched.map_err(|e| AnalysisError::NewsUnavailable {
            date: date.unwrap_or("latest").to_string(),
            reason: e.to_string(),
        })?;

        self.analyze_with(&snapshot, query, model).await
    }

    /// Analyze with an explicit model for this call only
    pub async fn analyze_with(
        &self,
        snapshot: &NewsSnapshot,
        query: Option<&str>,
        model: &ModelSpec,
    ) -> Result<AnalysisResult, AnalysisError> {
        snapshot
            .validate()
            .map_err(|e| AnalysisError::InvalidSnapshot(e.to_string()))?;

        if model.name.trim().is_empty() {
            return Err(AnalysisError::ModelUnavailable {
                model: model.name.clone(),
                host: model.host.clone(),
                reason: "model name is blank".to_string(),
            });
        }

        tracing::info!(
            date = %snapshot.date,
            model = %model.name,
            host = %model.host,
            articles = snapshot.total_articles(),
            "Starting news analysis"
        );

        // 1. Backend liveness
        if let BackendStatus::Unreachable { reason } = self.guard.check_backend(&model.host).await {
            return Err(AnalysisError::BackendDown {
                host: model.host.clone(),
                reason,
            });
        }

        // 2. Model presence
        match self.guard.ensure_model(&model.host, &model.name).await {
            ModelStatus::Ready => {}
            ModelStatus::ProvisionFailed { model: name, reason } => {
                return Err(AnalysisError::ModelUnavailable {
                    model: name,
                    host: model.host.clone(),
                    reason,
                });
            }
            ModelStatus::Unreachable { reason } => {
                return Err(AnalysisError::BackendDown {
                    host: model.host.clone(),
                    reason,
                });
            }
        }

        // 3. Prompt
        let request = GenerateRequest {
            model: model.name.clone(),
            prompt: analysis_prompt(snapshot, query),
            options: SamplingOptions::default(),
        };

        // 4. Inference
        let reply = self
            .backend
            .generate(&model.host, &request)
            .await
            .map_err(|e| match e {
                BackendError::Decode(reason) => AnalysisError::EmptyResponse {
                    model: model.name.clone(),
                    reason: format!("malformed payload: {}", reason),
                },
                other => AnalysisError::TransportFailure {
                    host: model.host.clone(),
                    reason: other.to_string(),
                },
            })?;

        // 5. Normalize
        let text = reply
            .response
            .as_deref()
            .map(str::trim)
            .ok_or_else(|| AnalysisError::EmptyResponse {
                model: model.name.clone(),
                reason: "response field missing".to_string(),
            })?;

        if text.is_empty() {
            return Err(AnalysisError::EmptyResponse {
                model: model.name.clone(),
                reason: "response was blank".to_string(),
            });
        }

        tracing::info!(
            date = %snapshot.date,
            model = %model.name,
            chars = text.len(),
            eval_count = reply.eval_count,
            duration_ms = reply.total_duration.map(|ns| ns / 1_000_000),
            "Analysis complete"
        );

        Ok(AnalysisResult {
            text: text.to_string(),
            model: model.name.clone(),
            date: snapshot.date.clone(),
        })
    }
}
