//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Ollama: LLM backend API client
//! - News File: snapshot directory reader
//! - CLI: Command-line interface handlers

pub mod ollama;
pub mod news_file;
pub mod cli;

pub use ollama::{OllamaClient, OllamaConfig};
pub use news_file::JsonFileNewsSource;
pub use cli::CliApp;
