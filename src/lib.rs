// src/lib.rs
// Public library surface for the binary and the integration tests.

pub mod api;
pub mod config;
pub mod enrich;
pub mod history;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::enrich::EnrichmentClient;
pub use crate::history::IngestHistory;
pub use crate::ingest::{fetcher::NewsFetcher, IngestPipeline, IngestReport};
pub use crate::store::ContentStore;

use std::sync::Arc;

use tracing::info;

/// Everything the service runs on, wired from one configuration.
pub struct App {
    pub state: AppState,
    pub pipeline: Arc<IngestPipeline>,
}

impl App {
    pub fn from_config(cfg: &AppConfig) -> Self {
        let store = Arc::new(ContentStore::new());
        let enricher = Arc::new(EnrichmentClient::from_config(&cfg.ai));
        let history = Arc::new(IngestHistory::default());
        let fetcher = NewsFetcher::from_config(&cfg.feed);

        info!(
            target: "ingest",
            backend = enricher.backend_name(),
            feed = fetcher.provider_name(),
            every_min = cfg.ingest_interval_minutes,
            "service wired"
        );

        let pipeline = Arc::new(
            IngestPipeline::new(Arc::clone(&store), Arc::clone(&enricher), fetcher)
                .with_history(Arc::clone(&history)),
        );
        Self {
            state: AppState {
                store,
                enricher,
                history,
            },
            pipeline,
        }
    }
}
