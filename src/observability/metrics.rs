//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define controller metrics (cycles, validations, reloads)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `reloader_sync_total` (counter): cycles by outcome
//! - `reloader_sync_duration_seconds` (histogram): cycle latency
//! - `reloader_validation_failures_total` (counter): rejected candidates
//! - `reloader_reloads_total` (counter): reload signals by result
//! - `reloader_template_reloads_total` (counter): template swaps by result
//! - `reloader_template_generation` (gauge): published template generation
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op, so library code
//!   and tests never need to set one up

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished synchronisation cycle.
pub fn record_sync(outcome: &'static str, started: Instant) {
    counter!("reloader_sync_total", "outcome" => outcome).increment(1);
    histogram!("reloader_sync_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_validation_failure() {
    counter!("reloader_validation_failures_total").increment(1);
}

/// Record a reload signal sent to the proxy.
pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("reloader_reloads_total", "result" => result).increment(1);
}

/// Record a template reload attempt.
pub fn record_template_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("reloader_template_reloads_total", "result" => result).increment(1);
}

pub fn record_template_generation(generation: u64) {
    gauge!("reloader_template_generation").set(generation as f64);
}
