//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_requests_total` (counter): proxied requests by method, status, target
//! - `balancer_request_duration_seconds` (histogram): proxy latency distribution
//! - `balancer_heartbeats_total` (counter): accepted control-channel reports
//! - `balancer_nodes_available` (gauge): routable set size after each pass
//! - `balancer_nodes_evicted_total` (counter): evictions by cause

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener. Without this,
/// every recording below is a no-op through the facade.
pub fn init_metrics(addr: SocketAddr) {
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        tracing::error!(error = %e, "failed to install metrics exporter");
        return;
    }

    describe_counter!("balancer_requests_total", "Proxied requests");
    describe_histogram!(
        "balancer_request_duration_seconds",
        "Proxy request latency in seconds"
    );
    describe_counter!("balancer_heartbeats_total", "Accepted node heartbeats");
    describe_gauge!(
        "balancer_nodes_available",
        "Routable nodes after the last reconciliation"
    );
    describe_counter!("balancer_nodes_evicted_total", "Node evictions by cause");

    tracing::info!(address = %addr, "metrics exporter listening");
}

/// Record one proxied request (including local refusals).
pub fn record_request(method: &str, status: u16, target: &str, start: Instant) {
    counter!(
        "balancer_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "target" => target.to_string()
    )
    .increment(1);
    histogram!("balancer_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record one accepted heartbeat.
pub fn record_heartbeat() {
    counter!("balancer_heartbeats_total").increment(1);
}

/// Record the routable set size published by a reconciliation pass.
pub fn record_pool_size(available: usize) {
    gauge!("balancer_nodes_available").set(available as f64);
}

/// Record one eviction with its cause ("overloaded" or "stale").
pub fn record_eviction(cause: &'static str) {
    counter!("balancer_nodes_evicted_total", "cause" => cause).increment(1);
}
