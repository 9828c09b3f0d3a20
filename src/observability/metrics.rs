//! Metrics collection and exposition.
//!
//! # Metrics
//! - `interceptor_requests_total` (counter): requests by decision, status
//! - `interceptor_request_duration_seconds` (histogram): latency by decision
//! - `interceptor_upstream_errors_total` (counter): forwarding failures by kind
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished request.
pub fn record_request(decision: &'static str, status: u16, start: Instant) {
    counter!(
        "interceptor_requests_total",
        "decision" => decision,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("interceptor_request_duration_seconds", "decision" => decision)
        .record(start.elapsed().as_secs_f64());
}

/// Record a failed upstream exchange.
pub fn record_upstream_error(kind: &'static str) {
    counter!("interceptor_upstream_errors_total", "kind" => kind).increment(1);
}
