// src/ingest/providers/newsapi.rs
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use rand::seq::IndexedRandom;
use serde::Deserialize;

use crate::ingest::types::{RawItem, SourceProvider};
use crate::ingest::{normalize_body, normalize_text};
use crate::model::slugify;

pub const NEWS_API_URL: &str = "https://newsapi.org/v2";

const TECH_SOURCES: &str =
    "wired,the-verge,techcrunch,ars-technica,hacker-news,engadget,recode,techradar";

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    #[serde(default)]
    source: NewsApiSource,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NewsApiSource {
    id: Option<String>,
    name: Option<String>,
}

/// NewsAPI `/everything` search, one random topic per fetch.
pub struct NewsApiProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    topics: Vec<String>,
}

impl NewsApiProvider {
    pub fn new(api_key: String, topics: Vec<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("sillygeeks-news/0.1")
            .timeout(timeout)
            .build()
            .context("building newsapi http client")?;
        Ok(Self {
            http,
            api_key,
            base_url: NEWS_API_URL.to_string(),
            topics,
        })
    }

    /// Point at a different API root (mirror, proxy, or a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Random pick spreads coverage across runs.
    pub fn pick_topic(&self) -> &str {
        self.topics
            .choose(&mut rand::rng())
            .map(String::as_str)
            .unwrap_or("technology")
    }
}

#[async_trait]
impl SourceProvider for NewsApiProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        let topic = self.pick_topic();
        tracing::info!(target: "fetch", provider = "newsapi", topic, "fetching batch");

        let t0 = std::time::Instant::now();
        let resp = self
            .http
            .get(format!("{}/everything", self.base_url))
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", topic),
                ("sources", TECH_SOURCES),
                ("language", "en"),
                ("sortBy", "publishedAt"),
            ])
            .send()
            .await
            .context("newsapi get()")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("newsapi returned HTTP {status}");
        }
        let body: NewsApiResponse = resp.json().await.context("decoding newsapi response")?;
        if body.status != "ok" {
            bail!(
                "newsapi status {}: {}",
                body.status,
                body.message.unwrap_or_default()
            );
        }

        let out = items_from_articles(body.articles);
        histogram!("fetch_duration_ms", "provider" => "newsapi")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("fetch_items_total", "provider" => "newsapi").increment(out.len() as u64);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }
}

fn items_from_articles(articles: Vec<NewsApiArticle>) -> Vec<RawItem> {
    articles
        .into_iter()
        .filter_map(|a| {
            let title = normalize_text(a.title.as_deref()?);
            // NewsAPI replaces takedowns with "[Removed]" placeholders
            if title.is_empty() || title == "[Removed]" {
                return None;
            }
            let url = a.url.filter(|u| !u.trim().is_empty())?;
            let published_at = a
                .published_at
                .as_deref()
                .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())?
                .with_timezone(&Utc);

            let body = a
                .content
                .filter(|c| !c.trim().is_empty())
                .or(a.description)
                .unwrap_or_else(|| "No content available".to_string());
            let source_name = a
                .source
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Unknown".to_string());
            let source_id = a
                .source
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| slugify(&source_name));

            Some(RawItem {
                title,
                content: normalize_body(&body),
                url: url.trim().to_string(),
                image_url: a.url_to_image.filter(|u| !u.trim().is_empty()),
                published_at,
                source_id,
                source_name,
            })
        })
        .collect()
}
