//! Sequential reconciliation loop.
//!
//! # Responsibilities
//! - Turn triggers (state change, periodic tick, SIGHUP, admin request)
//!   into synchronisation cycles
//! - Run cycles strictly one at a time
//! - Retry failed cycles with backoff
//!
//! # Design Decisions
//! - Triggers that arrive during a cycle are coalesced into one follow-up
//! - The desired state is re-read at the start of every cycle

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant};

use crate::config::RetryConfig;
use crate::model::load_state;
use crate::observability::metrics;
use crate::resilience::RetryBackoff;
use crate::sync::controller::SyncController;
use crate::sync::status::StatusBoard;

/// Why a cycle is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The desired state source changed.
    StateChanged,
    /// Operator asked for a resync (SIGHUP or admin API).
    Requested,
}

/// Owns the loop that feeds desired state into the controller.
pub struct Reconciler {
    controller: Arc<SyncController>,
    state_path: PathBuf,
    status: Arc<StatusBoard>,
    backoff: RetryBackoff,
    resync_interval: Duration,
}

impl Reconciler {
    pub fn new(
        controller: Arc<SyncController>,
        state_path: impl Into<PathBuf>,
        status: Arc<StatusBoard>,
        retry: &RetryConfig,
        resync_interval: Duration,
    ) -> Self {
        Self {
            controller,
            state_path: state_path.into(),
            status,
            backoff: RetryBackoff::new(retry),
            resync_interval,
        }
    }

    /// Run until shutdown. The first cycle starts immediately.
    pub async fn run(
        mut self,
        mut triggers: mpsc::Receiver<Trigger>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!(
            state = %self.state_path.display(),
            interval_secs = self.resync_interval.as_secs(),
            "Reconciler starting"
        );

        let mut ticker = time::interval(self.resync_interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        let mut retry_at: Option<Instant> = None;

        loop {
            let deadline = retry_at;
            let retry = async move {
                match deadline {
                    Some(deadline) => time::sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                _ = ticker.tick() => {
                    tracing::trace!("Periodic resync");
                }
                trigger = triggers.recv() => {
                    let Some(trigger) = trigger else { break };
                    tracing::debug!(?trigger, "Sync requested");
                }
                _ = retry => {
                    tracing::info!(attempt = self.backoff.failures() + 1, "Retrying failed sync");
                }
                _ = shutdown.recv() => {
                    tracing::info!("Reconciler received shutdown signal, exiting loop");
                    break;
                }
            }

            // Requests that queued up while we waited are served by this cycle.
            while triggers.try_recv().is_ok() {}

            retry_at = if self.cycle().await {
                self.backoff.reset();
                None
            } else {
                let delay = self.backoff.next_delay();
                tracing::warn!(
                    delay_ms = delay.as_millis() as u64,
                    failures = self.backoff.failures(),
                    "Sync failed, scheduling retry"
                );
                Some(Instant::now() + delay)
            };
        }

        tracing::info!("Reconciler stopped");
    }

    /// Run one cycle; returns whether it succeeded.
    pub async fn cycle(&self) -> bool {
        let state = match load_state(&self.state_path) {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(path = %self.state_path.display(), error = %e, "Failed to load desired state");
                self.status.record_failure("state", e.to_string());
                return false;
            }
        };

        let result = self.controller.synchronize(&state).await;
        let generation = self.controller.templates().generation();
        metrics::record_template_generation(generation);
        self.status.record(&result, generation);
        result.is_ok()
    }
}
