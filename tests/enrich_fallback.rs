// tests/enrich_fallback.rs
//
// Enrichment client behaviour with scripted backends: local fallback,
// breaker tripping, malformed answers and the connectivity probe.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sillygeeks_news::enrich::{
    fallback, BackendState, EnrichmentClient, Prompt, Task, TextBackend,
};

const HOUR: Duration = Duration::from_secs(3_600);

fn candidates() -> Vec<String> {
    ["AI", "Gadgets", "Software", "Cybersecurity", "Blockchain", "Quantum Computing"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Fails every call and counts how often it was asked.
#[derive(Default)]
struct DownBackend {
    calls: AtomicUsize,
}

#[async_trait]
impl TextBackend for DownBackend {
    async fn complete(&self, _prompt: &Prompt) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("503 service unavailable"))
    }
    fn name(&self) -> &'static str {
        "down"
    }
}

/// Answers by task; `fail_first` calls error out before it recovers.
struct ScriptedBackend {
    calls: AtomicUsize,
    fail_first: usize,
    tags_answer: &'static str,
}

impl ScriptedBackend {
    fn healthy() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_first: 0,
            tags_answer: r#"{"tags":["AI","Chips","Cloud"]}"#,
        }
    }
}

#[async_trait]
impl TextBackend for ScriptedBackend {
    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_first {
            return Err(anyhow!("connection reset"));
        }
        Ok(match prompt.task {
            Task::Summarize => "A model got better at reasoning. Researchers are excited.".into(),
            Task::Categorize => "ai".into(),
            Task::Tags => self.tags_answer.into(),
            Task::Probe => "ok".into(),
        })
    }
    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct SlowBackend;

#[async_trait]
impl TextBackend for SlowBackend {
    async fn complete(&self, _prompt: &Prompt) -> Result<String> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok("too late".into())
    }
    fn name(&self) -> &'static str {
        "slow"
    }
}

const TITLE: &str = "New Zero-Day Vulnerability Found by Security Researchers";
const TEXT: &str = "A critical vulnerability lets attackers run commands remotely. \
    Security teams are patching. The hack has not been seen in the wild.";

#[tokio::test]
async fn fallback_is_deterministic() {
    let client = EnrichmentClient::demo();

    let s1 = client.summarize(TEXT).await;
    let s2 = client.summarize(TEXT).await;
    assert_eq!(s1, s2);
    assert_eq!(s1, fallback::summarize(TEXT));

    let c1 = client.categorize(TITLE, TEXT, &candidates()).await;
    let c2 = client.categorize(TITLE, TEXT, &candidates()).await;
    assert_eq!(c1, c2);
    assert_eq!(c1, "Cybersecurity");

    let tags = client.generate_tags(TITLE, TEXT).await;
    assert_eq!(tags, vec!["cybersecurity".to_string()]);
}

#[tokio::test]
async fn categorize_without_matches_picks_first_candidate() {
    let client = EnrichmentClient::demo();
    let got = client
        .categorize("Weekly roundup", "Nothing topical here.", &candidates())
        .await;
    assert_eq!(got, "AI");
    assert_eq!(client.categorize("x", "y", &[]).await, "");
}

#[tokio::test]
async fn failing_backend_trips_the_breaker_after_one_call() {
    let backend = Arc::new(DownBackend::default());
    let client = EnrichmentClient::with_backend(backend.clone(), Duration::from_secs(2), HOUR);

    for _ in 0..3 {
        let summary = client.summarize(TEXT).await;
        assert_eq!(summary, fallback::summarize(TEXT));
        let cat = client.categorize(TITLE, TEXT, &candidates()).await;
        assert_eq!(cat, "Cybersecurity");
        let tags = client.generate_tags(TITLE, TEXT).await;
        assert!(!tags.is_empty());
    }

    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert!(matches!(
        client.breaker().state(),
        BackendState::Unavailable { .. }
    ));
}

#[tokio::test]
async fn elapsed_reprobe_window_allows_a_trial_call() {
    let backend = Arc::new(ScriptedBackend {
        fail_first: 1,
        ..ScriptedBackend::healthy()
    });
    let client = EnrichmentClient::with_backend(backend.clone(), Duration::from_secs(2), Duration::ZERO);

    assert_eq!(client.summarize(TEXT).await, fallback::summarize(TEXT));
    assert!(matches!(client.breaker().state(), BackendState::Unavailable { .. }));

    let second = client.summarize(TEXT).await;
    assert!(second.starts_with("A model got better"));
    assert_eq!(client.breaker().state(), BackendState::Available);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn healthy_backend_answers_are_coerced() {
    let backend = Arc::new(ScriptedBackend::healthy());
    let client = EnrichmentClient::with_backend(backend, Duration::from_secs(2), HOUR);

    assert_eq!(client.categorize(TITLE, TEXT, &candidates()).await, "AI");
    assert_eq!(
        client.generate_tags(TITLE, TEXT).await,
        vec!["AI".to_string(), "Chips".to_string(), "Cloud".to_string()]
    );
    assert_eq!(client.breaker().state(), BackendState::Available);
}

#[tokio::test]
async fn malformed_tags_fall_back_and_open_the_breaker() {
    let backend = Arc::new(ScriptedBackend {
        tags_answer: "ai, chips, cloud",
        ..ScriptedBackend::healthy()
    });
    let client = EnrichmentClient::with_backend(backend, Duration::from_secs(2), HOUR);

    let tags = client.generate_tags(TITLE, TEXT).await;
    assert_eq!(tags, fallback::tags(TITLE, TEXT));
    assert!(matches!(client.breaker().state(), BackendState::Unavailable { .. }));
}

#[tokio::test]
async fn slow_backend_times_out_into_fallback() {
    let client = EnrichmentClient::with_backend(Arc::new(SlowBackend), Duration::from_millis(20), HOUR);
    assert_eq!(client.summarize(TEXT).await, fallback::summarize(TEXT));
    assert!(matches!(client.breaker().state(), BackendState::Unavailable { .. }));
}

#[tokio::test]
async fn probe_ignores_an_open_breaker_and_closes_it() {
    let backend = Arc::new(ScriptedBackend::healthy());
    let client = EnrichmentClient::with_backend(backend.clone(), Duration::from_secs(2), HOUR);
    client.breaker().record_failure();

    let status = client.test_connection().await;
    assert!(status.ok, "{}", status.message);
    assert_eq!(client.breaker().state(), BackendState::Available);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn probe_reports_a_down_backend() {
    let client = EnrichmentClient::with_backend(
        Arc::new(DownBackend::default()),
        Duration::from_secs(2),
        HOUR,
    );
    let status = client.test_connection().await;
    assert!(!status.ok);
    assert!(status.message.contains("down"));
}
