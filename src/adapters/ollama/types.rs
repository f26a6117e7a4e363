//! Ollama API wire types
//!
//! Request/response bodies for `/api/tags`, `/api/pull` and `/api/generate`.

use serde::{Deserialize, Serialize};

use crate::ports::{GenerateReply, ModelEntry, SamplingOptions};

/// `GET /api/tags` response
#[derive(Debug, Clone, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

/// `POST /api/pull` body
#[derive(Debug, Clone, Serialize)]
pub struct PullBody<'a> {
    pub name: &'a str,
}

/// One line of the streamed pull progress
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullProgress {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl PullProgress {
    /// Scan newline-delimited progress records.
    ///
    /// Returns the last reported status, or the first error the backend
    /// reported mid-stream. Lines that are not JSON are ignored.
    pub fn scan(body: &str) -> Result<Option<String>, String> {
        let mut last_status = None;
        for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Ok(progress) = serde_json::from_str::<PullProgress>(line) else {
                continue;
            };
            if let Some(error) = progress.error {
                return Err(error);
            }
            if progress.status.is_some() {
                last_status = progress.status;
            }
        }
        Ok(last_status)
    }
}

/// `POST /api/generate` body
#[derive(Debug, Clone, Serialize)]
pub struct GenerateBody<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: SamplingOptions,
}

/// `POST /api/generate` response (non-streaming)
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub eval_count: Option<u64>,
    #[serde(default)]
    pub total_duration: Option<u64>,
}

impl From<GenerateResponse> for GenerateReply {
    fn from(r: GenerateResponse) -> Self {
        GenerateReply {
            response: r.response,
            eval_count: r.eval_count,
            total_duration: r.total_duration,
        }
    }
}
