// src/enrich/mod.rs
//! Text enrichment: summary, category and tags for an article.
//!
//! Every operation has a deterministic local fallback, so no call here can
//! fail. Backend outages trip a breaker: while it is open the backend is not
//! contacted and the fallback answers directly.

pub mod backend;
pub mod breaker;
pub mod fallback;
pub mod response;

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AiConfig;
pub use backend::{OpenAiBackend, Prompt, Task, TextBackend};
pub use breaker::{BackendBreaker, BackendState};

/// Body text beyond this many characters is not sent to the backend.
const PROMPT_TEXT_BUDGET: usize = 6_000;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub ok: bool,
    pub message: String,
}

pub struct EnrichmentClient {
    backend: Option<Arc<dyn TextBackend>>,
    breaker: BackendBreaker,
    timeout: Duration,
}

impl EnrichmentClient {
    /// Real backend when a key is configured, local fallback ("demo mode") otherwise.
    pub fn from_config(cfg: &AiConfig) -> Self {
        if !cfg.has_credentials() {
            info!(target: "enrich", "no OpenAI API key configured, using local fallback");
            return Self::demo();
        }
        match OpenAiBackend::new(cfg) {
            Ok(b) => Self::with_backend(Arc::new(b), cfg.timeout(), cfg.reprobe_after()),
            Err(e) => {
                warn!(target: "enrich", error = ?e, "openai backend unavailable, using local fallback");
                Self::demo()
            }
        }
    }

    pub fn demo() -> Self {
        Self {
            backend: None,
            breaker: BackendBreaker::new(Duration::MAX),
            timeout: Duration::ZERO,
        }
    }

    pub fn with_backend(
        backend: Arc<dyn TextBackend>,
        timeout: Duration,
        reprobe_after: Duration,
    ) -> Self {
        Self {
            backend: Some(backend),
            breaker: BackendBreaker::new(reprobe_after),
            timeout,
        }
    }

    pub fn is_demo_mode(&self) -> bool {
        self.backend.is_none()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.as_ref().map_or("local", |b| b.name())
    }

    pub fn breaker(&self) -> &BackendBreaker {
        &self.breaker
    }

    /// ~2-3 sentence abstract of `text`.
    pub async fn summarize(&self, text: &str) -> String {
        let prompt = Prompt {
            task: Task::Summarize,
            system: None,
            user: format!(
                "Please summarize the following tech news article in about 2-3 sentences \
                 while preserving key points and technical details:\n\n{}",
                clip(text, PROMPT_TEXT_BUDGET)
            ),
            json: false,
            max_tokens: 150,
        };
        match self.ask(&prompt, response::clean_summary).await {
            Some(s) => s,
            None => fallback::summarize(text),
        }
    }

    /// Exactly one of `candidates` (empty string only when there are none).
    pub async fn categorize(&self, title: &str, text: &str, candidates: &[String]) -> String {
        if candidates.is_empty() {
            return String::new();
        }
        let prompt = Prompt {
            task: Task::Categorize,
            system: None,
            user: format!(
                "Based on the following tech article title and content, categorize it into one \
                 of these categories: {}. Respond with only the category name that best fits \
                 the article.\n\nTitle: {}\n\nContent: {}",
                candidates.join(", "),
                title,
                clip(text, PROMPT_TEXT_BUDGET)
            ),
            json: false,
            max_tokens: 20,
        };
        match self
            .ask(&prompt, |raw| response::coerce_category(raw, candidates))
            .await
        {
            Some(c) => c,
            None => fallback::categorize(title, text, candidates),
        }
    }

    /// 3-5 topical tags from the backend; the local fallback may return fewer.
    pub async fn generate_tags(&self, title: &str, text: &str) -> Vec<String> {
        let prompt = Prompt {
            task: Task::Tags,
            system: Some(
                "You are a tech content expert. Respond with JSON in this format: \
                 { \"tags\": [\"tag1\", \"tag2\", \"tag3\"] }"
                    .to_string(),
            ),
            user: format!(
                "Based on the following tech article title and content, generate 3-5 relevant \
                 tags for categorization (only tag names, no descriptions).\n\nTitle: {}\n\n\
                 Content: {}",
                title,
                clip(text, PROMPT_TEXT_BUDGET)
            ),
            json: true,
            max_tokens: 100,
        };
        match self.ask(&prompt, response::parse_tags).await {
            Some(t) => t,
            None => fallback::tags(title, text),
        }
    }

    /// Diagnostic probe. Always contacts the backend (ignoring the breaker) and
    /// records the outcome, so a success closes an open breaker.
    pub async fn test_connection(&self) -> ConnectionStatus {
        let Some(backend) = self.backend.as_ref() else {
            return ConnectionStatus {
                ok: false,
                message: "No OpenAI API key provided. The application is running in demo mode."
                    .to_string(),
            };
        };
        let prompt = Prompt {
            task: Task::Probe,
            system: None,
            user: "Test connection".to_string(),
            json: false,
            max_tokens: 5,
        };
        match tokio::time::timeout(self.timeout, backend.complete(&prompt)).await {
            Ok(Ok(_)) => {
                self.breaker.record_success();
                ConnectionStatus {
                    ok: true,
                    message: format!("Successfully connected to {} API.", backend.name()),
                }
            }
            Ok(Err(e)) => {
                self.breaker.record_failure();
                ConnectionStatus {
                    ok: false,
                    message: format!(
                        "Failed to connect to {} API ({e}). The application is running in demo mode.",
                        backend.name()
                    ),
                }
            }
            Err(_) => {
                self.breaker.record_failure();
                ConnectionStatus {
                    ok: false,
                    message: format!(
                        "Connection to {} API timed out after {}s. The application is running in demo mode.",
                        backend.name(),
                        self.timeout.as_secs()
                    ),
                }
            }
        }
    }

    /// One backend round-trip plus parse. Timeouts, transport errors and
    /// unparsable answers all open the breaker and yield `None`.
    async fn ask<T>(&self, prompt: &Prompt, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
        let op = prompt.task.as_str();
        let answer = self.call(prompt).await;
        let parsed = match answer {
            Some(raw) => {
                let parsed = parse(&raw);
                if parsed.is_some() {
                    self.breaker.record_success();
                } else {
                    warn!(target: "enrich", op, "malformed backend response");
                    counter!("enrich_backend_calls_total", "op" => op, "outcome" => "malformed")
                        .increment(1);
                    self.breaker.record_failure();
                }
                parsed
            }
            None => None,
        };
        if parsed.is_none() {
            debug!(target: "enrich", op, "using local fallback");
            counter!("enrich_fallback_total", "op" => op).increment(1);
        }
        parsed
    }

    async fn call(&self, prompt: &Prompt) -> Option<String> {
        let backend = self.backend.as_ref()?;
        if !self.breaker.allow() {
            return None;
        }
        let op = prompt.task.as_str();
        match tokio::time::timeout(self.timeout, backend.complete(prompt)).await {
            Ok(Ok(raw)) => {
                counter!("enrich_backend_calls_total", "op" => op, "outcome" => "ok").increment(1);
                Some(raw)
            }
            Ok(Err(e)) => {
                warn!(target: "enrich", op, backend = backend.name(), error = ?e, "backend call failed");
                counter!("enrich_backend_calls_total", "op" => op, "outcome" => "error").increment(1);
                self.breaker.record_failure();
                None
            }
            Err(_) => {
                warn!(target: "enrich", op, backend = backend.name(), timeout_s = self.timeout.as_secs(), "backend call timed out");
                counter!("enrich_backend_calls_total", "op" => op, "outcome" => "timeout")
                    .increment(1);
                self.breaker.record_failure();
                None
            }
        }
    }
}

/// At most `max` characters of `s`, cut on a char boundary.
fn clip(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
