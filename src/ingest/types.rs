// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Candidate article as delivered by a source, before enrichment.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    pub content: String,
    /// Canonical link; the dedup key once stored.
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source_id: String,
    pub source_name: String,
}

impl RawItem {
    /// Title and url are present (publishedAt is enforced by the type).
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.url.trim().is_empty()
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>>;
    fn name(&self) -> &'static str;
}
