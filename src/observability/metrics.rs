//! Metrics collection and exposition.
//!
//! # Metrics
//! - `shellgate_requests_total` (counter): user-plane requests by method, status
//! - `shellgate_request_duration_seconds` (histogram): user-plane latency
//! - `shellgate_active_handlers` (gauge): handlers currently registered
//! - `shellgate_worker_runs_total` (counter): worker outcomes
//! - `shellgate_routes` (gauge): routes in the current table
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start_time: Instant) {
    metrics::counter!(
        "shellgate_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("shellgate_request_duration_seconds")
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_active_handlers(count: usize) {
    metrics::gauge!("shellgate_active_handlers").set(count as f64);
}

pub fn record_worker_run(outcome: &'static str) {
    metrics::counter!("shellgate_worker_runs_total", "outcome" => outcome).increment(1);
}

pub fn record_route_count(count: usize) {
    metrics::gauge!("shellgate_routes").set(count as f64);
}
