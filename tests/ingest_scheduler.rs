// tests/ingest_scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sillygeeks_news::enrich::EnrichmentClient;
use sillygeeks_news::ingest::fetcher::NewsFetcher;
use sillygeeks_news::ingest::scheduler::spawn_ingest_scheduler;
use sillygeeks_news::ingest::types::{RawItem, SourceProvider};
use sillygeeks_news::ingest::IngestPipeline;
use sillygeeks_news::store::ContentStore;

struct SlowProvider;

#[async_trait]
impl SourceProvider for SlowProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>> {
        tokio::time::sleep(Duration::from_millis(150)).await;
        Ok(vec![RawItem {
            title: "Slow feed story".into(),
            content: "Arrives late but arrives.".into(),
            url: "https://news.test/slow".into(),
            image_url: None,
            published_at: Utc::now(),
            source_id: "slow".into(),
            source_name: "Slow".into(),
        }])
    }
    fn name(&self) -> &'static str {
        "slow"
    }
}

#[tokio::test]
async fn overlapping_run_is_skipped_not_queued() {
    let store = Arc::new(ContentStore::new());
    let pipeline = IngestPipeline::new(
        store.clone(),
        Arc::new(EnrichmentClient::demo()),
        NewsFetcher::with_provider(Box::new(SlowProvider), Duration::from_secs(2)),
    );

    let (first, second) = tokio::join!(pipeline.try_run(), pipeline.try_run());

    assert_eq!(first.map(|r| r.created), Some(1));
    assert!(second.is_none(), "second run should be skipped while the first is in flight");
    assert!(!pipeline.is_running());

    // flag is released: a later run proceeds (and finds nothing new)
    let third = pipeline.try_run().await.expect("run after completion");
    assert_eq!(third.skipped_existing, 1);
    assert_eq!(store.article_count(), 1);
}

#[tokio::test]
async fn scheduler_runs_immediately_on_start() {
    let store = Arc::new(ContentStore::new());
    let pipeline = Arc::new(IngestPipeline::new(
        store.clone(),
        Arc::new(EnrichmentClient::demo()),
        NewsFetcher::fixtures_only(),
    ));

    let handle = spawn_ingest_scheduler(pipeline, Duration::from_secs(3_600));

    let mut waited = Duration::ZERO;
    while store.article_count() < 5 && waited < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }
    handle.abort();

    assert_eq!(store.article_count(), 5);
}
