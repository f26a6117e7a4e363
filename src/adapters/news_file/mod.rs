//! JSON File News Source
//!
//! Reads collector output from a directory of `YYYY-MM-DD.json` files.
//! Read-only: the collector that writes these files lives outside this crate.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::NewsSnapshot;
use crate::ports::{NewsSourceError, NewsSourcePort};

/// News source backed by a snapshot directory
#[derive(Debug, Clone)]
pub struct JsonFileNewsSource {
    dir: PathBuf,
}

impl JsonFileNewsSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    /// Dates that have a snapshot file, unsorted
    async fn available_dates(&self) -> Result<Vec<NaiveDate>, NewsSourceError> {
        let mut dates = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(date) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            {
                dates.push(date);
            }
        }

        Ok(dates)
    }

    async fn load(&self, date: NaiveDate) -> Result<NewsSnapshot, NewsSourceError> {
        let path = self.path_for(date);
        tracing::debug!(path = %path.display(), "Loading news snapshot");

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(NewsSourceError::NotFound(date.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content)
            .map_err(|e| NewsSourceError::Parse(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl NewsSourcePort for JsonFileNewsSource {
    async fn latest(&self) -> Result<NewsSnapshot, NewsSourceError> {
        let latest = self
            .available_dates()
            .await?
            .into_iter()
            .max()
            .ok_or_else(|| NewsSourceError::NotFound(format!("any date in {}", self.dir.display())))?;

        self.load(latest).await
    }

    async fn by_date(&self, date: &str) -> Result<NewsSnapshot, NewsSourceError> {
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| NewsSourceError::InvalidDate(date.to_string()))?;
        self.load(parsed).await
    }
}
