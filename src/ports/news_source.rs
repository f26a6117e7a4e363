//! News source port
//!
//! Snapshots are produced by an external collector; the analysis core only
//! reads what this port returns.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::NewsSnapshot;

#[derive(Debug, Error)]
pub enum NewsSourceError {
    #[error("No news available for {0}")]
    NotFound(String),

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse snapshot: {0}")]
    Parse(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSourcePort: Send + Sync {
    /// Most recent snapshot available
    async fn latest(&self) -> Result<NewsSnapshot, NewsSourceError>;

    /// Snapshot for a calendar date (YYYY-MM-DD)
    async fn by_date(&self, date: &str) -> Result<NewsSnapshot, NewsSourceError>;
}
