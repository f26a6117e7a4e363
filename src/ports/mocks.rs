//! Recording fakes for the backend port.
//!
//! Used by unit tests and the integration tests under `tests/`.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::llm_backend::{
    BackendError, GenerateReply, GenerateRequest, LlmBackendPort, ModelEntry, ProvisionOutcome,
};

/// A call observed by [`MockBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Ping { host: String },
    ListModels { host: String },
    Pull { host: String, model: String },
    Generate { host: String, model: String, prompt: String },
}

/// How [`MockBackend`] answers generation requests
#[derive(Debug, Clone)]
pub enum GenerateBehavior {
    /// Same reply for every request
    Reply(Result<GenerateReply, BackendError>),
    /// Respond with the requested model name
    EchoModel,
}

/// Fake backend that records calls and serves configured responses
#[derive(Debug, Clone)]
pub struct MockBackend {
    calls: Arc<Mutex<Vec<BackendCall>>>,
    models: Arc<Mutex<Vec<ModelEntry>>>,
    reachable: bool,
    pull_error: Option<BackendError>,
    /// Successful pulls make the model visible after this many list calls
    pull_ready_after: Option<usize>,
    pending: Arc<Mutex<Vec<(String, usize)>>>,
    generate: GenerateBehavior,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            calls: Arc::default(),
            models: Arc::default(),
            reachable: true,
            pull_error: None,
            pull_ready_after: Some(0),
            pending: Arc::default(),
            generate: GenerateBehavior::Reply(Ok(GenerateReply::default())),
        }
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend refuses every connection
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::default()
        }
    }

    /// Builder method to add a resident model
    pub fn with_model(self, name: &str) -> Self {
        lock(&self.models).push(ModelEntry::named(name));
        self
    }

    /// Builder method to make pulls fail
    pub fn with_pull_error(mut self, error: BackendError) -> Self {
        self.pull_error = Some(error);
        self
    }

    /// Pulled models appear only after `polls` further list calls; `None` never
    pub fn with_pull_ready_after(mut self, polls: Option<usize>) -> Self {
        self.pull_ready_after = polls;
        self
    }

    /// Builder method to set the generation reply text
    pub fn with_response(mut self, text: &str) -> Self {
        self.generate = GenerateBehavior::Reply(Ok(GenerateReply {
            response: Some(text.to_string()),
            ..GenerateReply::default()
        }));
        self
    }

    pub fn with_generate(mut self, behavior: GenerateBehavior) -> Self {
        self.generate = behavior;
        self
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<BackendCall> {
        lock(&self.calls).clone()
    }

    pub fn ping_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Ping { .. }))
    }

    pub fn list_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::ListModels { .. }))
    }

    pub fn pull_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Pull { .. }))
    }

    pub fn generate_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Generate { .. }))
    }

    fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: BackendCall) {
        lock(&self.calls).push(call);
    }

    fn check_reachable(&self) -> Result<(), BackendError> {
        if self.reachable {
            Ok(())
        } else {
            Err(BackendError::Transport("connection refused".to_string()))
        }
    }

    /// Advance pending pulls by one list call, installing any that are due
    fn tick_pending(&self) {
        let mut pending = lock(&self.pending);
        let mut models = lock(&self.models);
        pending.retain_mut(|(name, remaining)| {
            if *remaining == 0 {
                models.push(ModelEntry::named(name.as_str()));
                false
            } else {
                *remaining -= 1;
                true
            }
        });
    }
}

#[async_trait]
impl LlmBackendPort for MockBackend {
    async fn ping(&self, host: &str) -> Result<(), BackendError> {
        self.record(BackendCall::Ping { host: host.to_string() });
        self.check_reachable()
    }

    async fn list_models(&self, host: &str) -> Result<Vec<ModelEntry>, BackendError> {
        self.record(BackendCall::ListModels { host: host.to_string() });
        self.check_reachable()?;
        self.tick_pending();
        Ok(lock(&self.models).clone())
    }

    async fn pull_model(&self, host: &str, model: &str) -> Result<ProvisionOutcome, BackendError> {
        self.record(BackendCall::Pull {
            host: host.to_string(),
            model: model.to_string(),
        });
        self.check_reachable()?;
        if let Some(ref err) = self.pull_error {
            return Err(err.clone());
        }
        if let Some(polls) = self.pull_ready_after {
            lock(&self.pending).push((model.to_string(), polls));
        }
        Ok(ProvisionOutcome::Accepted)
    }

    async fn generate(
        &self,
        host: &str,
        request: &GenerateRequest,
    ) -> Result<GenerateReply, BackendError> {
        self.record(BackendCall::Generate {
            host: host.to_string(),
            model: request.model.clone(),
            prompt: request.prompt.clone(),
        });
        self.check_reachable()?;
        match &self.generate {
            GenerateBehavior::Reply(reply) => reply.clone(),
            GenerateBehavior::EchoModel => Ok(GenerateReply {
                response: Some(format!("analysis by {}", request.model)),
                ..GenerateReply::default()
            }),
        }
    }
}
