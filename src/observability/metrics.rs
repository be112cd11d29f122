//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_upgrades_total` (counter): upgrade attempts by outcome
//! - `gateway_endpoint_requests_total` (counter): hits on `/config.js` and `/healthz`
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - The Prometheus exporter only runs when `METRICS_ADDRESS` is set

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the outcome of an upgrade attempt.
pub fn record_upgrade(accepted: bool) {
    let outcome = if accepted { "delegated" } else { "rejected" };
    counter!("gateway_upgrades_total", "outcome" => outcome).increment(1);
}

pub fn record_endpoint(endpoint: &'static str) {
    counter!("gateway_endpoint_requests_total", "endpoint" => endpoint).increment(1);
}
