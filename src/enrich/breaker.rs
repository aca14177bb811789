// src/enrich/breaker.rs
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    /// No call made yet.
    Unknown,
    Available,
    /// Last call failed at `since`; calls are skipped until `reprobe_after` elapses.
    Unavailable { since: Instant },
}

/// Remembers backend outages so a batch of enrichments does not pay one
/// timeout per article.
#[derive(Debug)]
pub struct BackendBreaker {
    state: Mutex<BackendState>,
    reprobe_after: Duration,
}

impl BackendBreaker {
    pub fn new(reprobe_after: Duration) -> Self {
        Self {
            state: Mutex::new(BackendState::Unknown),
            reprobe_after,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> BackendState {
        *self.lock()
    }

    /// Whether the next call may go to the backend. Once the reprobe window has
    /// elapsed exactly one trial call passes; the window restarts with it.
    pub fn allow(&self) -> bool {
        let mut g = self.lock();
        match *g {
            BackendState::Unavailable { since } => {
                if since.elapsed() >= self.reprobe_after {
                    *g = BackendState::Unavailable {
                        since: Instant::now(),
                    };
                    true
                } else {
                    false
                }
            }
            _ => true,
        }
    }

    pub fn record_success(&self) {
        *self.lock() = BackendState::Available;
    }

    pub fn record_failure(&self) {
        *self.lock() = BackendState::Unavailable {
            since: Instant::now(),
        };
    }

    pub fn label(&self) -> &'static str {
        match self.state() {
            BackendState::Unknown => "unknown",
            BackendState::Available => "available",
            BackendState::Unavailable { .. } => "unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_opens_until_reprobe_window() {
        let b = BackendBreaker::new(Duration::from_secs(3600));
        assert!(b.allow());
        b.record_failure();
        assert!(!b.allow());
        assert!(!b.allow());
        assert_eq!(b.label(), "unavailable");
        b.record_success();
        assert!(b.allow());
        assert_eq!(b.state(), BackendState::Available);
    }

    #[test]
    fn zero_window_allows_trial_after_failure() {
        let b = BackendBreaker::new(Duration::ZERO);
        b.record_failure();
        assert!(b.allow());
    }
}
