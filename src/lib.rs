//! Newsdesk - Financial news analysis with a locally hosted LLM
//!
//! Feeds a day's categorized financial news into an Ollama-compatible server
//! and returns a narrative market analysis.
//!
//! # Modules
//!
//! - `domain`: Snapshot, model and result types; prompt rendering
//! - `ports`: Trait abstractions (LlmBackendPort, NewsSourcePort)
//! - `adapters`: External implementations (Ollama, JSON snapshot files, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Model availability guard and analysis orchestrator

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
