//! News Snapshot Types
//!
//! A snapshot is a dated, categorized bundle of articles handed to the analysis
//! pipeline by an external collector. The collector's JSON layout
//! (`categories_found` / `news_by_category`) is accepted as an alias.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Snapshot validation failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    #[error("Invalid snapshot date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Category '{0}' is listed more than once")]
    DuplicateCategory(String),

    #[error("Category '{0}' has articles but is not listed in categories")]
    UnlistedCategory(String),
}

/// Article sentiment as tagged by the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Neutral => write!(f, "neutral"),
            Self::Negative => write!(f, "negative"),
        }
    }
}

/// Article counts per sentiment across a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SentimentCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentCounts {
    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }

    /// Share of articles with `sentiment`, 0.0 for an empty snapshot
    pub fn share(&self, sentiment: Sentiment) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let count = match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        };
        count as f64 / total as f64
    }
}

/// A single news article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub headline: String,
    /// May be absent or empty
    #[serde(default)]
    pub summary: Option<String>,
    /// Ticker symbols, in the order the collector reported them
    #[serde(default)]
    pub related_stocks: Vec<String>,
    /// Publication timestamp as reported by the source
    pub time: String,
    #[serde(default)]
    pub sentiment: Sentiment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Article {
    /// Create an article with no summary, tickers or source metadata
    pub fn new(headline: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            headline: headline.into(),
            summary: None,
            related_stocks: Vec::new(),
            time: time.into(),
            sentiment: Sentiment::Neutral,
            source: None,
            url: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_stocks<I, S>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related_stocks = tickers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = sentiment;
        self
    }

    /// Summary text when present and non-empty
    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref().filter(|s| !s.is_empty())
    }
}

/// A dated, categorized set of articles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsSnapshot {
    /// ISO 8601 calendar date (YYYY-MM-DD)
    pub date: String,
    /// Display order of categories
    #[serde(alias = "categories_found")]
    pub categories: Vec<String>,
    #[serde(alias = "news_by_category", default)]
    pub articles_by_category: HashMap<String, Vec<Article>>,
}

impl NewsSnapshot {
    /// Create an empty snapshot for a date
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            categories: Vec::new(),
            articles_by_category: HashMap::new(),
        }
    }

    /// Append a category (and its articles) in display order
    pub fn with_category(mut self, name: impl Into<String>, articles: Vec<Article>) -> Self {
        let name = name.into();
        if !self.categories.contains(&name) {
            self.categories.push(name.clone());
        }
        self.articles_by_category.entry(name).or_default().extend(articles);
        self
    }

    /// Articles for a category, empty if the category has none
    pub fn articles(&self, category: &str) -> &[Article] {
        self.articles_by_category
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Categories paired with their articles, in display order
    pub fn iter_categories(&self) -> impl Iterator<Item = (&str, &[Article])> {
        self.categories
            .iter()
            .map(move |name| (name.as_str(), self.articles(name)))
    }

    pub fn total_articles(&self) -> usize {
        self.articles_by_category.values().map(Vec::len).sum()
    }

    /// Sentiment distribution over every article in the snapshot
    pub fn sentiment_counts(&self) -> SentimentCounts {
        self.articles_by_category
            .values()
            .flatten()
            .fold(SentimentCounts::default(), |mut counts, article| {
                match article.sentiment {
                    Sentiment::Positive => counts.positive += 1,
                    Sentiment::Neutral => counts.neutral += 1,
                    Sentiment::Negative => counts.negative += 1,
                }
                counts
            })
    }

    /// Parsed calendar date; only the zero-padded `YYYY-MM-DD` form is accepted
    pub fn parsed_date(&self) -> Result<NaiveDate, SnapshotError> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .ok()
            .filter(|date| date.format("%Y-%m-%d").to_string() == self.date)
            .ok_or_else(|| SnapshotError::InvalidDate(self.date.clone()))
    }

    /// Check the date format and the category listing invariant
    pub fn validate(&self) -> Result<(), SnapshotError> {
        self.parsed_date()?;

        let mut seen = HashSet::with_capacity(self.categories.len());
        for name in &self.categories {
            if !seen.insert(name.as_str()) {
                return Err(SnapshotError::DuplicateCategory(name.clone()));
            }
        }

        // Sorted so the reported category is stable across runs
        let mut keys: Vec<&String> = self.articles_by_category.keys().collect();
        keys.sort();
        if let Some(unlisted) = keys.into_iter().find(|k| !seen.contains(k.as_str())) {
            return Err(SnapshotError::UnlistedCategory(unlisted.clone()));
        }

        Ok(())
    }
}
