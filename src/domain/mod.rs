//! Domain Layer - Core types and pure logic
//!
//! No network access happens here; all external interactions go through the
//! ports layer.
//!
//! - `news`: news snapshot and article types
//! - `analysis`: model selection, results and the analysis error taxonomy
//! - `prompt`: deterministic prompt rendering

pub mod news;
pub mod analysis;
pub mod prompt;

pub use news::{Article, NewsSnapshot, Sentiment, SentimentCounts, SnapshotError};
pub use analysis::{
    AnalysisError, AnalysisErrorKind, AnalysisResult, ModelSpec, DEFAULT_HOST, DEFAULT_MODEL,
};
pub use prompt::{analysis_prompt, financial_context};
