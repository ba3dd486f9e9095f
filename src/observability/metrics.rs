//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, cache events, guard outcomes)
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, outcome
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_cache_events_total` (counter): hit/stale/miss/refresh_failed per cache
//! - `gateway_guard_redirects_total` (counter): redirects issued by guard hooks
//!
//! # Design Decisions
//! - Override-active requests increment counters but skip the latency
//!   histogram (developer previews must not skew sampling)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter started"),
        Err(error) => tracing::error!(error = %error, "failed to start metrics exporter"),
    }
}

/// Record a completed request.
///
/// `sampled` is false for override-active requests, which are excluded
/// from the latency histogram.
pub fn record_request(method: &str, status: u16, outcome: &str, start: Instant, sampled: bool) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome.to_string(),
    )
    .increment(1);

    if sampled {
        metrics::histogram!(
            "gateway_request_duration_seconds",
            "method" => method.to_string(),
        )
        .record(start.elapsed().as_secs_f64());
    }
}

/// Record a cache lookup event (`hit`, `stale`, `miss`, `refresh_failed`).
pub fn record_cache_event(cache: &'static str, event: &'static str) {
    metrics::counter!(
        "gateway_cache_events_total",
        "cache" => cache,
        "event" => event,
    )
    .increment(1);
}

/// Record a redirect issued by a guard hook.
pub fn record_guard_redirect(code: u16) {
    metrics::counter!(
        "gateway_guard_redirects_total",
        "code" => code.to_string(),
    )
    .increment(1);
}
