//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the reuploader server:
//! - HTTP request metrics (latency, counts)
//! - Orchestrator status and tracked torrents (collected dynamically)
//! - Core metrics (cycles, uploads, identity lookups, external services)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reuploader_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reuploader_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reuploader_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Orchestrator Metrics (collected dynamically)
// =============================================================================

/// Orchestrator running state (1 = running, 0 = stopped).
pub static ORCHESTRATOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "reuploader_orchestrator_running",
        "Whether the polling loop is running (1) or stopped (0)",
    )
    .unwrap()
});

/// Tracked torrents by status.
pub static TORRENTS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "reuploader_torrents_by_status",
            "Current tracked torrent count by status",
        ),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Orchestrator
    registry
        .register(Box::new(ORCHESTRATOR_RUNNING.clone()))
        .unwrap();
    registry
        .register(Box::new(TORRENTS_BY_STATUS.clone()))
        .unwrap();

    // Core metrics (cycles, uploads, identity, external services)
    for metric in reuploader_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the store's current contents.
pub async fn collect_dynamic_metrics(state: &AppState) {
    let status = state.orchestrator().status().await;
    ORCHESTRATOR_RUNNING.set(if status.running { 1 } else { 0 });

    TORRENTS_BY_STATUS.reset();
    for (status, count) in &status.torrents_by_status {
        TORRENTS_BY_STATUS
            .with_label_values(&[status.as_str()])
            .set(*count);
    }
}

/// Normalize a path for metric labels (replace hashes with placeholders).
pub fn normalize_path(path: &str) -> String {
    static HASH_RE: Lazy<regex_lite::Regex> =
        Lazy::new(|| regex_lite::Regex::new(r"[0-9a-fA-F]{40}").unwrap());
    static NUMERIC_RE: Lazy<regex_lite::Regex> =
        Lazy::new(|| regex_lite::Regex::new(r"/\d+(/|$)").unwrap());

    let result = HASH_RE.replace_all(path, "{hash}");
    let result = NUMERIC_RE.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_hash() {
        let path = "/api/v1/torrents/a94a8fe5ccb19ba61c4c0873d391e987982fbbd3";
        assert_eq!(normalize_path(path), "/api/v1/torrents/{hash}");
    }

    #[test]
    fn test_normalize_path_hash_with_suffix() {
        let path = "/api/v1/torrents/a94a8fe5ccb19ba61c4c0873d391e987982fbbd3/outcomes";
        assert_eq!(normalize_path(path), "/api/v1/torrents/{hash}/outcomes");
    }

    #[test]
    fn test_normalize_path_numeric() {
        let path = "/api/v1/torrents/12345";
        assert_eq!(normalize_path(path), "/api/v1/torrents/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        let path = "/api/v1/health";
        assert_eq!(normalize_path(path), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("reuploader_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        // Touch metrics so they appear in output
        // (vectors only output label sets that have been accessed)
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        ORCHESTRATOR_RUNNING.set(0);
        TORRENTS_BY_STATUS.with_label_values(&["PENDING"]).set(0);
        reuploader_core::metrics::RETRIES_EXHAUSTED.inc_by(0);

        let output = encode_metrics();

        // HTTP metrics
        assert!(output.contains("reuploader_http_request_duration_seconds"));
        assert!(output.contains("reuploader_http_requests_in_flight"));

        // Orchestrator metrics
        assert!(output.contains("reuploader_orchestrator_running"));
        assert!(output.contains("reuploader_torrents_by_status"));

        // Core metrics
        assert!(output.contains("reuploader_retries_exhausted_total"));
    }
}
