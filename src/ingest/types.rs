// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::time::Duration;

/// Sentinel used when an item carries no outlet name.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// Loosely-shaped item as an adapter pulled it out of its feed or API.
/// Every field is optional; the normalizer decides the fallbacks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawItem {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub link: Option<String>,
    pub source: Option<String>,
    /// Structured timestamp, when the source provides one.
    pub published_at: Option<DateTime<Utc>>,
    /// Human-readable published string (e.g. an RSS `pubDate`).
    pub published: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

/// Canonical record; one row of the output file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct NewsRecord {
    pub title: String,
    pub description: String,
    pub url: String,
    pub source: String,
    pub published: Option<DateTime<Utc>>,
    pub category: String,
    pub image_url: Option<String>,
    pub date_loaded: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// Deliberate skip: the adapter needs an env var that is not set.
    MissingCredential { var: String },
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn readiness(&self) -> Readiness {
        Readiness::Ready
    }

    /// Maximum age of items kept from this adapter. `None` keeps everything.
    fn lookback(&self) -> Option<Duration> {
        None
    }

    async fn fetch(&self) -> Result<Vec<RawItem>>;
}
