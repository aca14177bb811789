// src/ingest/fetcher.rs
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use tracing::{info, warn};

use crate::config::FeedConfig;
use crate::ingest::providers::{fixture_items, NewsApiProvider, RssProvider};
use crate::ingest::types::{RawItem, SourceProvider};

/// Where a batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchSource {
    Live,
    Fixtures,
}

#[derive(Debug, Clone)]
pub struct FetchedBatch {
    pub source: BatchSource,
    pub items: Vec<RawItem>,
}

/// One live provider (if configured) backed by the built-in fixtures.
/// `fetch_batch` never fails: errors and timeouts degrade to fixtures.
pub struct NewsFetcher {
    live: Option<Box<dyn SourceProvider>>,
    timeout: Duration,
}

impl NewsFetcher {
    /// RSS when `NEWS_RSS_URL` is set, else NewsAPI when a key is present,
    /// else fixtures only.
    pub fn from_config(cfg: &FeedConfig) -> Self {
        let live: Option<Box<dyn SourceProvider>> = if let Some(url) = cfg.rss_url.as_deref() {
            match RssProvider::from_url(url, cfg.timeout()) {
                Ok(p) => Some(Box::new(p)),
                Err(e) => {
                    warn!(target: "fetch", error = ?e, "rss provider unavailable");
                    None
                }
            }
        } else if let Some(key) = cfg.news_api_key.as_deref() {
            match NewsApiProvider::new(key.to_string(), cfg.topics.clone(), cfg.timeout()) {
                Ok(p) => Some(Box::new(p)),
                Err(e) => {
                    warn!(target: "fetch", error = ?e, "newsapi provider unavailable");
                    None
                }
            }
        } else {
            None
        };

        if live.is_none() {
            info!(target: "fetch", "no news feed configured, serving fixture articles");
        }
        Self {
            live,
            timeout: cfg.timeout(),
        }
    }

    pub fn fixtures_only() -> Self {
        Self {
            live: None,
            timeout: Duration::ZERO,
        }
    }

    pub fn with_provider(provider: Box<dyn SourceProvider>, timeout: Duration) -> Self {
        Self {
            live: Some(provider),
            timeout,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.live.as_ref().map_or("fixtures", |p| p.name())
    }

    pub async fn fetch_batch(&self) -> FetchedBatch {
        let Some(provider) = self.live.as_ref() else {
            return fixtures();
        };

        let items = match tokio::time::timeout(self.timeout, provider.fetch_latest()).await {
            Ok(Ok(items)) => items,
            Ok(Err(e)) => {
                warn!(target: "fetch", provider = provider.name(), error = ?e, "provider error, using fixtures");
                counter!("ingest_provider_errors_total").increment(1);
                return fixtures();
            }
            Err(_) => {
                warn!(target: "fetch", provider = provider.name(), timeout_s = self.timeout.as_secs(), "provider timed out, using fixtures");
                counter!("ingest_provider_errors_total").increment(1);
                return fixtures();
            }
        };

        let total = items.len();
        let items: Vec<RawItem> = items.into_iter().filter(RawItem::is_complete).collect();
        if items.len() < total {
            info!(target: "fetch", dropped = total - items.len(), "dropped incomplete items");
        }
        FetchedBatch {
            source: BatchSource::Live,
            items,
        }
    }
}

fn fixtures() -> FetchedBatch {
    FetchedBatch {
        source: BatchSource::Fixtures,
        items: fixture_items(Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    struct Broken;

    #[async_trait]
    impl SourceProvider for Broken {
        async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
            Err(anyhow!("connection refused"))
        }
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn provider_error_degrades_to_fixtures() {
        let f = NewsFetcher::with_provider(Box::new(Broken), Duration::from_secs(1));
        let batch = f.fetch_batch().await;
        assert_eq!(batch.source, BatchSource::Fixtures);
        assert_eq!(batch.items.len(), 5);
    }

    #[tokio::test]
    async fn unconfigured_feed_serves_fixtures() {
        let cfg = FeedConfig {
            news_api_key: None,
            rss_url: None,
            timeout_secs: 1,
            topics: vec![],
        };
        let f = NewsFetcher::from_config(&cfg);
        assert_eq!(f.provider_name(), "fixtures");
        assert_eq!(f.fetch_batch().await.source, BatchSource::Fixtures);
    }
}
