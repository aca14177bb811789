// src/ingest/providers/rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::ingest::types::{RawItem, SourceProvider};
use crate::ingest::{normalize_body, normalize_text};
use crate::model::slugify;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "content:encoded")]
    encoded: Option<String>,
    enclosure: Option<Enclosure>,
}

#[derive(Debug, Deserialize)]
struct Enclosure {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@type", default)]
    kind: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    let dt = OffsetDateTime::parse(ts.trim(), &Rfc2822).ok()?;
    DateTime::from_timestamp(dt.unix_timestamp(), dt.nanosecond())
}

/// RSS 2.0 channel, fetched over HTTP or parsed from a string.
pub struct RssProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl RssProvider {
    pub fn from_url(url: impl Into<String>, timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("sillygeeks-news/0.1")
            .timeout(timeout)
            .build()
            .context("building rss http client")?;
        Ok(Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        })
    }

    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    fn parse_items_from_str(s: &str) -> Result<Vec<RawItem>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

        let source_name = rss
            .channel
            .title
            .as_deref()
            .map(normalize_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "RSS".to_string());
        let source_id = slugify(&source_name);

        let mut out = Vec::with_capacity(rss.channel.items.len());
        for it in rss.channel.items {
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            let url = it.link.as_deref().map(str::trim).unwrap_or_default();
            let Some(published_at) = it.pub_date.as_deref().and_then(parse_rfc2822) else {
                continue;
            };
            if title.is_empty() || url.is_empty() {
                continue;
            }

            let body = it
                .encoded
                .as_deref()
                .or(it.description.as_deref())
                .map(normalize_body)
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| title.clone());
            let image_url = it
                .enclosure
                .filter(|e| e.kind.as_deref().is_none_or(|k| k.starts_with("image/")))
                .and_then(|e| e.url)
                .filter(|u| !u.trim().is_empty());

            out.push(RawItem {
                title,
                content: body,
                url: url.to_string(),
                image_url,
                published_at,
                source_id: source_id.clone(),
                source_name: source_name.clone(),
            });
        }

        histogram!("fetch_parse_ms", "provider" => "rss")
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("fetch_items_total", "provider" => "rss").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for RssProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_items_from_str(s),
            Mode::Http { url, client } => {
                tracing::info!(target: "fetch", provider = "rss", url = %url, "fetching feed");
                let resp = client.get(url).send().await.context("rss http get()")?;
                let status = resp.status();
                if !status.is_success() {
                    anyhow::bail!("rss feed returned HTTP {status}");
                }
                let body = resp.text().await.context("rss http .text()")?;
                Self::parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "rss"
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
