// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ingest::IngestPipeline;

/// Runs the pipeline immediately, then every `every`.
///
/// Each tick spawns its run so a slow run never delays the timer; a tick that
/// lands while a run is in flight is skipped by [`IngestPipeline::try_run`].
pub fn spawn_ingest_scheduler(pipeline: Arc<IngestPipeline>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let p = Arc::clone(&pipeline);
            tokio::spawn(async move {
                if p.try_run().await.is_none() {
                    tracing::info!(target: "ingest", "scheduled tick skipped, previous run still active");
                }
            });
        }
    })
}
