//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_routed_total` (counter): envelopes republished, by target
//! - `dispatch_route_misses_total` (counter): envelopes with no route, unlabeled
//! - `dispatch_decode_errors_total` (counter): undecodable bodies, by worker
//! - `dispatch_attempts_total` (counter): work-unit attempts, by worker
//! - `dispatch_retries_total` (counter): backoff sleeps entered, by worker
//! - `dispatch_outcomes_total` (counter): terminal outcomes, by worker and outcome
//! - `dispatch_request_duration_seconds` (histogram): first attempt to outcome
//! - `dispatch_outcome_publish_errors_total` (counter): outcomes the bus refused
//!
//! # Design Decisions
//! - Label values come only from configuration (routed targets, worker names),
//!   so the series count is bounded; unmatched targets go to logs instead

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tokio::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_routed(target: &str) {
    metrics::counter!("dispatch_routed_total", "target" => target.to_string()).increment(1);
}

pub fn record_route_miss() {
    metrics::counter!("dispatch_route_misses_total").increment(1);
}

pub fn record_decode_error(worker: &str) {
    metrics::counter!("dispatch_decode_errors_total", "worker" => worker.to_string())
        .increment(1);
}

pub fn record_attempt(worker: &str) {
    metrics::counter!("dispatch_attempts_total", "worker" => worker.to_string()).increment(1);
}

pub fn record_retry(worker: &str) {
    metrics::counter!("dispatch_retries_total", "worker" => worker.to_string()).increment(1);
}

pub fn record_outcome(worker: &str, outcome: &'static str, started: Instant) {
    metrics::counter!(
        "dispatch_outcomes_total",
        "worker" => worker.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "dispatch_request_duration_seconds",
        "worker" => worker.to_string(),
        "outcome" => outcome
    )
    .record(started.elapsed().as_secs_f64());
}

pub fn record_outcome_publish_error(worker: &str) {
    metrics::counter!(
        "dispatch_outcome_publish_errors_total",
        "worker" => worker.to_string()
    )
    .increment(1);
}
