//! Model Availability Guard
//!
//! Confirms the backend answers and the requested model is resident before
//! any inference call. A missing model is pulled once, then the model list is
//! polled with exponential backoff until the model shows up or the attempts
//! run out. Nothing here retries the probe, list or pull calls themselves.

use std::sync::Arc;
use std::time::Duration;

use crate::ports::{BackendError, LlmBackendPort, ModelEntry};

/// Readiness polling after a pull has been accepted
#[derive(Debug, Clone, PartialEq)]
pub struct ProvisionPolicy {
    /// Model-list checks after the pull; 0 trusts the pull response alone
    pub poll_attempts: u32,
    /// Delay before the second check; doubles after each miss
    pub poll_interval: Duration,
    /// Upper bound for a single delay
    pub max_poll_interval: Duration,
}

impl Default for ProvisionPolicy {
    fn default() -> Self {
        Self {
            poll_attempts: 10,
            poll_interval: Duration::from_secs(2),
            max_poll_interval: Duration::from_secs(30),
        }
    }
}

impl ProvisionPolicy {
    /// Delay after the `attempt`-th (zero-based) miss
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.poll_interval
            .checked_mul(factor)
            .unwrap_or(self.max_poll_interval)
            .min(self.max_poll_interval)
    }
}

/// Result of a liveness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Ready,
    Unreachable { reason: String },
}

/// Result of a model presence check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelStatus {
    Ready,
    ProvisionFailed { model: String, reason: String },
    Unreachable { reason: String },
}

fn contains_model(models: &[ModelEntry], model: &str) -> bool {
    models.iter().any(|m| m.matches(model))
}

/// Backend liveness and model presence checks
#[derive(Clone)]
pub struct ModelAvailabilityGuard {
    backend: Arc<dyn LlmBackendPort>,
    policy: ProvisionPolicy,
}

impl ModelAvailabilityGuard {
    pub fn new(backend: Arc<dyn LlmBackendPort>) -> Self {
        Self::with_policy(backend, ProvisionPolicy::default())
    }

    pub fn with_policy(backend: Arc<dyn LlmBackendPort>, policy: ProvisionPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> &ProvisionPolicy {
        &self.policy
    }

    /// Probe the backend once
    pub async fn check_backend(&self, host: &str) -> BackendStatus {
        match self.backend.ping(host).await {
            Ok(()) => {
                tracing::debug!(host, "Backend is up");
                BackendStatus::Ready
            }
            Err(e) => {
                tracing::warn!(host, error = %e, "Backend probe failed");
                BackendStatus::Unreachable { reason: e.to_string() }
            }
        }
    }

    /// Make sure `model` is resident on `host`, pulling it if absent
    pub async fn ensure_model(&self, host: &str, model: &str) -> ModelStatus {
        if model.trim().is_empty() {
            return ModelStatus::ProvisionFailed {
                model: model.to_string(),
                reason: "model name is blank".to_string(),
            };
        }

        let models = match self.backend.list_models(host).await {
            Ok(models) => models,
            Err(e) => {
                tracing::warn!(host, error = %e, "Failed to list models");
                return ModelStatus::Unreachable { reason: e.to_string() };
            }
        };

        if contains_model(&models, model) {
            tracing::debug!(host, model, "Model already resident");
            return ModelStatus::Ready;
        }

        tracing::warn!(host, model, "Model not found, attempting to pull");
        if let Err(e) = self.backend.pull_model(host, model).await {
            tracing::error!(host, model, error = %e, "Model pull failed");
            return ModelStatus::ProvisionFailed {
                model: model.to_string(),
                reason: e.to_string(),
            };
        }

        self.await_ready(host, model).await
    }

    /// Poll the model list until the pulled model appears
    async fn await_ready(&self, host: &str, model: &str) -> ModelStatus {
        let attempts = self.policy.poll_attempts;
        if attempts == 0 {
            return ModelStatus::Ready;
        }

        let mut last_error: Option<BackendError> = None;
        for attempt in 0..attempts {
            match self.backend.list_models(host).await {
                Ok(models) if contains_model(&models, model) => {
                    tracing::info!(host, model, checks = attempt + 1, "Model is ready");
                    return ModelStatus::Ready;
                }
                Ok(_) => last_error = None,
                Err(e) => {
                    tracing::debug!(host, error = %e, "Readiness check failed");
                    last_error = Some(e);
                }
            }

            if attempt + 1 < attempts {
                let delay = self.policy.delay(attempt);
                tracing::debug!(model, ?delay, attempt = attempt + 1, attempts, "Model not ready yet");
                tokio::time::sleep(delay).await;
            }
        }

        let reason = match last_error {
            Some(e) => format!("not ready after {} checks, last error: {}", attempts, e),
            None => format!("not listed after {} readiness checks", attempts),
        };
        tracing::error!(host, model, %reason, "Model provisioning did not complete");
        ModelStatus::ProvisionFailed {
            model: model.to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::{BackendCall, MockBackend};

    const HOST: &str = "http://localhost:11434";

    fn fast_policy(poll_attempts: u32) -> ProvisionPolicy {
        ProvisionPolicy {
            poll_attempts,
            poll_interval: Duration::ZERO,
            max_poll_interval: Duration::ZERO,
        }
    }

    fn guard(mock: &MockBackend, attempts: u32) -> ModelAvailabilityGuard {
        ModelAvailabilityGuard::with_policy(Arc::new(mock.clone()), fast_policy(attempts))
    }

    #[test]
    fn test_policy_backoff() {
        let policy = ProvisionPolicy {
            poll_attempts: 5,
            poll_interval: Duration::from_secs(2),
            max_poll_interval: Duration::from_secs(10),
        };
        assert_eq!(policy.delay(0), Duration::from_secs(2));
        assert_eq!(policy.delay(1), Duration::from_secs(4));
        assert_eq!(policy.delay(2), Duration::from_secs(8));
        assert_eq!(policy.delay(3), Duration::from_secs(10));
        assert_eq!(policy.delay(40), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_check_backend_ready() {
        let mock = MockBackend::new();
        assert_eq!(guard(&mock, 1).check_backend(HOST).await, BackendStatus::Ready);
        assert_eq!(mock.ping_count(), 1);
    }

    #[tokio::test]
    async fn test_check_backend_unreachable() {
        let mock = MockBackend::unreachable();
        let status = guard(&mock, 1).check_backend(HOST).await;
        assert!(matches!(status, BackendStatus::Unreachable { .. }));
    }

    #[tokio::test]
    async fn test_model_present() {
        let mock = MockBackend::new().with_model("deepseek-r1:7b");
        let status = guard(&mock, 3).ensure_model(HOST, "deepseek-r1:7b").await;
        assert_eq!(status, ModelStatus::Ready);
        assert_eq!(mock.pull_count(), 0);
    }

    #[tokio::test]
    async fn test_substring_match() {
        let mock = MockBackend::new().with_model("deepseek-r1:7b");
        let status = guard(&mock, 3).ensure_model(HOST, "deepseek-r1").await;
        assert_eq!(status, ModelStatus::Ready);
    }

    #[tokio::test]
    async fn test_missing_model_pulled_once() {
        let mock = MockBackend::new().with_pull_ready_after(Some(2));
        let status = guard(&mock, 5).ensure_model(HOST, "llama3").await;

        assert_eq!(status, ModelStatus::Ready);
        assert_eq!(mock.pull_count(), 1);
        // Initial list plus three readiness checks
        assert_eq!(mock.list_count(), 4);
        assert!(mock.calls().contains(&BackendCall::Pull {
            host: HOST.to_string(),
            model: "llama3".to_string()
        }));
    }

    #[tokio::test]
    async fn test_pull_rejected() {
        let mock = MockBackend::new().with_pull_error(BackendError::Status {
            status: 500,
            body: "no space left".to_string(),
        });
        let status = guard(&mock, 3).ensure_model(HOST, "llama3").await;

        match status {
            ModelStatus::ProvisionFailed { model, reason } => {
                assert_eq!(model, "llama3");
                assert!(reason.contains("no space left"));
            }
            other => panic!("Expected ProvisionFailed, got {:?}", other),
        }
        assert_eq!(mock.pull_count(), 1);
    }

    #[tokio::test]
    async fn test_pull_never_ready() {
        let mock = MockBackend::new().with_pull_ready_after(None);
        let status = guard(&mock, 3).ensure_model(HOST, "llama3").await;

        assert!(matches!(status, ModelStatus::ProvisionFailed { .. }));
        assert_eq!(mock.pull_count(), 1);
        assert_eq!(mock.list_count(), 4);
    }

    #[tokio::test]
    async fn test_zero_attempts_trusts_pull() {
        let mock = MockBackend::new().with_pull_ready_after(None);
        let status = guard(&mock, 0).ensure_model(HOST, "llama3").await;

        assert_eq!(status, ModelStatus::Ready);
        assert_eq!(mock.list_count(), 1);
    }

    #[tokio::test]
    async fn test_list_unreachable() {
        let mock = MockBackend::unreachable();
        let status = guard(&mock, 3).ensure_model(HOST, "llama3").await;
        assert!(matches!(status, ModelStatus::Unreachable { .. }));
        assert_eq!(mock.pull_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_model_never_provisioned() {
        let mock = MockBackend::new().with_model("llama3:8b");
        let status = guard(&mock, 3).ensure_model(HOST, "").await;

        assert!(matches!(status, ModelStatus::ProvisionFailed { .. }));
        assert!(mock.calls().is_empty());
    }
}
