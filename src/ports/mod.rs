//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, these traits abstract:
//! - The LLM inference backend (liveness, model listing, provisioning, generation)
//! - The news snapshot source

pub mod llm_backend;
pub mod news_source;
pub mod mocks;

pub use llm_backend::{
    BackendError, GenerateReply, GenerateRequest, LlmBackendPort, ModelEntry, ProvisionOutcome,
    SamplingOptions,
};
pub use news_source::{NewsSourceError, NewsSourcePort};
