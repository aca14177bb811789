//! history.rs — in-memory ring of recent ingestion run reports.

use std::sync::Mutex;

use crate::ingest::IngestReport;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

#[derive(Debug)]
pub struct IngestHistory {
    inner: Mutex<Vec<IngestReport>>,
    cap: usize,
}

impl Default for IngestHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl IngestHistory {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.clamp(1, 10_000);
        Self {
            inner: Mutex::new(Vec::with_capacity(cap)),
            cap,
        }
    }

    pub fn push(&self, report: IngestReport) {
        let mut v = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        v.push(report);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    /// Up to `n` most recent reports, oldest first.
    pub fn snapshot_last_n(&self, n: usize) -> Vec<IngestReport> {
        let v = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let start = v.len().saturating_sub(n);
        v[start..].to_vec()
    }

    pub fn last(&self) -> Option<IngestReport> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
