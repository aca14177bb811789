// src/ingest/mod.rs
//! Ingestion pipeline: fetch, dedupe, enrich, persist, tag, finalize.
//!
//! Items are processed one at a time in fetch order. A failing item is logged
//! and counted; the rest of the batch carries on.

pub mod fetcher;
pub mod providers;
pub mod scheduler;
pub mod types;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use serde::Serialize;

use crate::enrich::EnrichmentClient;
use crate::history::IngestHistory;
use crate::ingest::fetcher::{BatchSource, NewsFetcher};
use crate::ingest::types::RawItem;
use crate::model::{slugify, ArticlePatch, NewArticle};
use crate::store::{ContentStore, StoreError};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_runs_total", "Completed ingestion runs.");
        describe_counter!(
            "ingest_runs_skipped_total",
            "Runs skipped because another run was in flight."
        );
        describe_counter!("ingest_articles_created_total", "Articles persisted.");
        describe_counter!(
            "ingest_skipped_existing_total",
            "Items skipped because their url is already stored."
        );
        describe_counter!(
            "ingest_item_failures_total",
            "Items that failed to persist; the run continued."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Feed fetch errors and timeouts (served from fixtures)."
        );
        describe_histogram!("ingest_run_ms", "Ingestion run time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when ingest pipeline last ran."
        );
        describe_counter!(
            "enrich_backend_calls_total",
            "Generative backend calls by op and outcome."
        );
        describe_counter!(
            "enrich_fallback_total",
            "Enrichment answers served by the local fallback."
        );
    });
}

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_TRUNCATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\[\+\d+ chars\]\s*$").unwrap());

/// Single-line text: entities decoded, tags stripped, smart quotes
/// flattened, whitespace collapsed.
pub fn normalize_text(s: &str) -> String {
    let out = html_escape::decode_html_entities(s).to_string();
    let out = RE_TAGS.replace_all(&out, " ");
    let out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");
    RE_WS.replace_all(&out, " ").trim().to_string()
}

/// Article body: like [`normalize_text`] but keeps paragraph breaks and drops
/// the feed's "[+1234 chars]" truncation marker.
pub fn normalize_body(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s).to_string();
    let with_breaks = decoded
        .replace("</p>", "\n\n")
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n");
    let paragraphs: Vec<String> = with_breaks
        .split("\n\n")
        .map(normalize_text)
        .filter(|p| !p.is_empty())
        .collect();
    let body = paragraphs.join("\n\n");
    RE_TRUNCATION.replace(&body, "").trim().to_string()
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub started_at: DateTime<Utc>,
    pub source: BatchSource,
    pub fetched: usize,
    pub created: usize,
    pub skipped_existing: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

enum ItemOutcome {
    Created,
    Existing,
}

pub struct IngestPipeline {
    store: Arc<ContentStore>,
    enricher: Arc<EnrichmentClient>,
    fetcher: NewsFetcher,
    history: Option<Arc<IngestHistory>>,
    running: AtomicBool,
}

/// Clears the in-flight flag when the run ends, including on panic.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl IngestPipeline {
    pub fn new(
        store: Arc<ContentStore>,
        enricher: Arc<EnrichmentClient>,
        fetcher: NewsFetcher,
    ) -> Self {
        Self {
            store,
            enricher,
            fetcher,
            history: None,
            running: AtomicBool::new(false),
        }
    }

    /// Record every run report into `history`.
    pub fn with_history(mut self, history: Arc<IngestHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn store(&self) -> &Arc<ContentStore> {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Single-flight entry point: `None` when another run is in flight.
    pub async fn try_run(&self) -> Option<IngestReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!(target: "ingest", "ingest run already in flight, skipping");
            counter!("ingest_runs_skipped_total").increment(1);
            return None;
        }
        let _guard = RunGuard(&self.running);
        Some(self.run_once().await)
    }

    /// One full run over a freshly fetched batch. Never fails as a whole.
    /// Callers that may overlap should use [`IngestPipeline::try_run`].
    pub async fn run_once(&self) -> IngestReport {
        let batch = self.fetcher.fetch_batch().await;
        self.ingest_items(batch.source, batch.items).await
    }

    /// Dedupe, enrich and persist `items` in order, then record the report.
    pub async fn ingest_items(&self, source: BatchSource, items: Vec<RawItem>) -> IngestReport {
        ensure_metrics_described();
        let started_at = Utc::now();
        let t0 = std::time::Instant::now();

        let mut report = IngestReport {
            started_at,
            source,
            fetched: items.len(),
            created: 0,
            skipped_existing: 0,
            failed: 0,
            duration_ms: 0,
        };

        for item in items {
            let url = item.url.clone();
            match self.ingest_item(item).await {
                Ok(ItemOutcome::Created) => report.created += 1,
                Ok(ItemOutcome::Existing) => report.skipped_existing += 1,
                Err(e) => {
                    tracing::warn!(target: "ingest", url = %url, error = ?e, "item failed, continuing");
                    report.failed += 1;
                }
            }
        }

        report.duration_ms = t0.elapsed().as_millis() as u64;

        counter!("ingest_runs_total").increment(1);
        counter!("ingest_articles_created_total").increment(report.created as u64);
        counter!("ingest_skipped_existing_total").increment(report.skipped_existing as u64);
        counter!("ingest_item_failures_total").increment(report.failed as u64);
        histogram!("ingest_run_ms").record(report.duration_ms as f64);
        gauge!("ingest_pipeline_last_run_ts").set(Utc::now().timestamp().max(0) as f64);

        tracing::info!(
            target: "ingest",
            source = ?report.source,
            fetched = report.fetched,
            created = report.created,
            skipped = report.skipped_existing,
            failed = report.failed,
            ms = report.duration_ms,
            "ingest run finished"
        );

        if let Some(h) = &self.history {
            h.push(report.clone());
        }
        report
    }

    async fn ingest_item(&self, item: RawItem) -> Result<ItemOutcome> {
        if self.store.get_article_by_url(&item.url).is_some() {
            return Ok(ItemOutcome::Existing);
        }

        let summary = self.enricher.summarize(&item.content).await;
        let summary = if summary.trim().is_empty() {
            item.title.clone()
        } else {
            summary
        };
        let names = self.store.category_names();
        let category = self
            .enricher
            .categorize(&item.title, &item.content, &names)
            .await;
        let tags = self.enricher.generate_tags(&item.title, &item.content).await;

        let category_id = match self.store.get_category_by_name(&category) {
            Some(c) => Some(c.id),
            None => {
                let first = self.store.list_categories().into_iter().next();
                tracing::warn!(
                    target: "ingest",
                    category = %category,
                    fallback = first.as_ref().map(|c| c.name.as_str()),
                    "unresolved category, using first category"
                );
                first.map(|c| c.id)
            }
        };

        let article = match self.store.create_article(NewArticle {
            title: item.title,
            content: item.content,
            summary,
            original_url: item.url,
            image_url: item.image_url,
            published_at: item.published_at,
            source_id: item.source_id,
            source_name: item.source_name,
            category_id,
        }) {
            Ok(a) => a,
            // stored by someone else since the dedup check
            Err(StoreError::DuplicateUrl(_)) => return Ok(ItemOutcome::Existing),
            Err(e) => return Err(e).context("creating article"),
        };

        let mut seen = HashSet::new();
        for name in tags {
            if !seen.insert(slugify(&name)) {
                continue;
            }
            match self.store.get_or_create_tag(&name) {
                Ok(tag) => {
                    self.store
                        .create_article_tag(article.id, tag.id)
                        .with_context(|| format!("linking tag {}", tag.slug))?;
                }
                Err(e) => {
                    tracing::debug!(target: "ingest", tag = %name, error = %e, "skipping unusable tag");
                }
            }
        }

        self.store
            .update_article(article.id, ArticlePatch::ai_processed(true))
            .context("finalizing article")?;
        tracing::debug!(target: "ingest", id = article.id, slug = %article.slug, "article ingested");
        Ok(ItemOutcome::Created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_decodes_and_collapses() {
        let s = "  Hello,&nbsp;&nbsp; <b>world</b>!  \u{201C}quoted\u{201D} ";
        assert_eq!(normalize_text(s), "Hello, world ! \"quoted\"");
    }

    #[test]
    fn normalize_body_keeps_paragraphs_and_drops_truncation_marker() {
        let s = "<p>First   para.</p><p>Second &amp; last… [+1532 chars]</p>";
        assert_eq!(normalize_body(s), "First para.\n\nSecond & last…");
    }
}
