//! Last-known synchronisation status, shared with the admin API.

use std::time::{SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::error::SyncError;
use crate::sync::controller::SyncOutcome;

/// Snapshot of the most recent cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    /// Unix seconds of the last finished cycle.
    pub last_attempt: Option<u64>,
    /// Unix seconds of the last successful cycle.
    pub last_success: Option<u64>,
    /// "reloaded", "unchanged" or the error kind of the last cycle.
    pub last_outcome: Option<String>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub reloads: u64,
    pub template_generation: u64,
}

/// Lock-free holder of the current [`SyncStatus`].
#[derive(Default)]
pub struct StatusBoard {
    inner: ArcSwap<SyncStatus>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SyncStatus {
        self.inner.load().as_ref().clone()
    }

    /// Record the result of one cycle.
    pub fn record(&self, result: &Result<SyncOutcome, SyncError>, template_generation: u64) {
        let now = unix_now();
        self.inner.rcu(|current| {
            let mut next = SyncStatus::clone(current);
            next.last_attempt = Some(now);
            next.template_generation = template_generation;
            match result {
                Ok(outcome) => {
                    next.last_success = Some(now);
                    next.last_outcome = Some(outcome.label().to_string());
                    next.last_error = None;
                    next.consecutive_failures = 0;
                    if outcome.reloaded() {
                        next.reloads += 1;
                    }
                }
                Err(e) => {
                    next.last_outcome = Some(e.kind().to_string());
                    next.last_error = Some(e.to_string());
                    next.consecutive_failures += 1;
                }
            }
            next
        });
    }

    /// Record a failure that happened before a cycle could start.
    pub fn record_failure(&self, kind: &str, message: String) {
        let now = unix_now();
        self.inner.rcu(|current| {
            let mut next = SyncStatus::clone(current);
            next.last_attempt = Some(now);
            next.last_outcome = Some(kind.to_string());
            next.last_error = Some(message.clone());
            next.consecutive_failures += 1;
            next
        });
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
