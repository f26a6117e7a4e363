//! Ollama Adapter
//!
//! Implementation of the LlmBackendPort for an Ollama server.
//! Handles liveness probes, model listing, pulls and generation.

mod client;
mod types;

pub use client::{OllamaClient, OllamaConfig};
pub use types::{GenerateBody, GenerateResponse, PullBody, PullProgress, TagsResponse};
