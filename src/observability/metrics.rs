//! Metrics collection and exposition.
//!
//! # Metrics
//! - `authgate_requests_total` (counter): requests by method, status
//! - `authgate_request_duration_seconds` (histogram): latency distribution
//! - `authgate_rate_limited_total` (counter): rejections by scope
//! - `authgate_auth_events_total` (counter): auth outcomes by action, success
//!
//! # Design Decisions
//! - Free functions over the `metrics` macros; callers never observe errors
//! - Prometheus exporter on a dedicated scrape address, off by default

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter. Failure is logged and otherwise
/// ignored; the gateway runs without metrics.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "authgate_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("authgate_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(scope: &str) {
    counter!("authgate_rate_limited_total", "scope" => scope.to_string()).increment(1);
}

pub fn record_auth_event(action: &str, success: bool) {
    counter!(
        "authgate_auth_events_total",
        "action" => action.to_string(),
        "success" => success.to_string()
    )
    .increment(1);
}
