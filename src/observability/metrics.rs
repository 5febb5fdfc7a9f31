//! Metrics collection and exposition.
//!
//! # Metrics
//! - `spectra_requests_rate_limited_total` (counter): rejections by limiter
//! - `spectra_rate_limit_evictions_total` (counter): swept records by limiter
//! - `spectra_rate_limit_tracked_keys` (gauge): live records by limiter
//! - `spectra_csrf_rejections_total` (counter): rejections by reason
//! - `spectra_csrf_tokens_issued_total` (counter): cookies minted

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rate_limited(limiter: &str) {
    counter!("spectra_requests_rate_limited_total", "limiter" => limiter.to_string()).increment(1);
}

pub fn record_rate_limit_sweep(limiter: &str, evicted: usize, tracked: usize) {
    counter!("spectra_rate_limit_evictions_total", "limiter" => limiter.to_string())
        .increment(evicted as u64);
    gauge!("spectra_rate_limit_tracked_keys", "limiter" => limiter.to_string()).set(tracked as f64);
}

pub fn record_csrf_rejected(reason: &'static str) {
    counter!("spectra_csrf_rejections_total", "reason" => reason).increment(1);
}

pub fn record_csrf_token_issued() {
    counter!("spectra_csrf_tokens_issued_total").increment(1);
}
