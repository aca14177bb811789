// src/config/mod.rs
//! Process configuration. Absent credentials are never an error: the
//! enrichment client falls back to local heuristics and the fetcher to
//! fixture articles.

pub mod ai;
pub mod topics;

use std::env;
use std::time::Duration;

pub use ai::AiConfig;

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";
pub const ENV_NEWS_RSS_URL: &str = "NEWS_RSS_URL";
pub const ENV_INGEST_INTERVAL_MINUTES: &str = "INGEST_INTERVAL_MINUTES";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";

pub const DEFAULT_INGEST_INTERVAL_MINUTES: u64 = 60;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
/// One week.
pub const MAX_INGEST_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub news_api_key: Option<String>,
    pub rss_url: Option<String>,
    pub timeout_secs: u64,
    pub topics: Vec<String>,
}

impl FeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub ai: AiConfig,
    pub feed: FeedConfig,
    pub ingest_interval_minutes: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let topics = match topics::load_topics_default() {
            Ok(t) if !t.is_empty() => t,
            Ok(_) => topics::default_topics(),
            Err(e) => {
                tracing::warn!(error = ?e, "topic list unreadable, using built-in topics");
                topics::default_topics()
            }
        };

        Self {
            ai: AiConfig::load_default(),
            feed: FeedConfig {
                news_api_key: env_nonempty(ENV_NEWS_API_KEY),
                rss_url: env_nonempty(ENV_NEWS_RSS_URL),
                timeout_secs: env_u64(ENV_FETCH_TIMEOUT_SECS)
                    .filter(|s| *s > 0)
                    .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
                topics,
            },
            ingest_interval_minutes: env_u64(ENV_INGEST_INTERVAL_MINUTES)
                .unwrap_or(DEFAULT_INGEST_INTERVAL_MINUTES)
                .clamp(1, MAX_INGEST_INTERVAL_MINUTES),
        }
    }

    pub fn ingest_interval(&self) -> Duration {
        Duration::from_secs(self.ingest_interval_minutes.saturating_mul(60))
    }
}

pub(crate) fn env_nonempty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|s| s.trim().parse::<u64>().ok())
}
