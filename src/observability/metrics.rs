//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, registry, discovery)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, target
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_registry_services` (gauge): services in the current registry
//! - `gateway_registry_generation` (gauge): current registry generation
//! - `gateway_discovery_cycles_total` (counter): cycles by outcome
//! - `gateway_manifest_fetch_failures_total` (counter): failures by service
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op
//! - Target label is the service name, "default", or "none"

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, target: &str, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "target" => target.to_string()
    )
    .increment(1);
    histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "target" => target.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// `outcome` is "success" or "error".
pub fn record_discovery_cycle(outcome: &str) {
    counter!("gateway_discovery_cycles_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn record_manifest_failure(service: &str) {
    counter!("gateway_manifest_fetch_failures_total", "service" => service.to_string()).increment(1);
}

pub fn record_registry(generation: u64, services: usize) {
    gauge!("gateway_registry_generation").set(generation as f64);
    gauge!("gateway_registry_services").set(services as f64);
}
