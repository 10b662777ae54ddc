//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, target
//! - `proxy_request_duration_seconds` (histogram): time to response headers
//! - `proxy_websocket_sessions_active` (gauge): live relay sessions
//! - `proxy_rate_limited_total` (counter): requests rejected by the limiter
//!
//! All recording functions are no-ops until [`init_metrics`] installs the
//! Prometheus recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, target: &str, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "target" => target.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "target" => target.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_session_opened() {
    metrics::gauge!("proxy_websocket_sessions_active").increment(1.0);
}

pub fn record_session_closed() {
    metrics::gauge!("proxy_websocket_sessions_active").decrement(1.0);
}

pub fn record_rate_limited() {
    metrics::counter!("proxy_rate_limited_total").increment(1);
}
