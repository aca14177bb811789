//! SillyGeeks News — Binary Entrypoint
//! Boots the Axum HTTP server, the ingestion scheduler and the metrics exporter.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sillygeeks_news::ingest::scheduler::spawn_ingest_scheduler;
use sillygeeks_news::metrics::Metrics;
use sillygeeks_news::{router, App, AppConfig};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - NEWS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("NEWS_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ingest=info,enrich=info,fetch=info,api=info,warn"));

    // Shuttle may already own the global subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = AppConfig::from_env();
    let metrics = Metrics::init(cfg.ingest_interval_minutes).context("initializing metrics")?;

    let app = App::from_config(&cfg);

    // First tick fires immediately: startup ingestion.
    spawn_ingest_scheduler(app.pipeline.clone(), cfg.ingest_interval());

    let router = router(app.state).merge(metrics.router());
    Ok(router.into())
}
