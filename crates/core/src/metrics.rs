//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Orchestrator (cycles, jobs, retries)
//! - Tracker uploads
//! - Identity resolution (lookups, searches, cache)
//! - External services (job source, trackers, identity backends)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// Poll cycles total by result.
pub static CYCLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reuploader_cycles_total", "Total orchestrator poll cycles"),
        &["result"], // "completed", "failed"
    )
    .unwrap()
});

/// Poll cycle duration in seconds.
pub static CYCLE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reuploader_cycle_duration_seconds",
            "Duration of one orchestrator poll cycle",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0]),
        &[],
    )
    .unwrap()
});

/// Jobs processed by resulting status.
pub static JOBS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reuploader_jobs_processed_total", "Total jobs processed"),
        &["status"],
    )
    .unwrap()
});

/// Pipeline failures by code.
pub static PIPELINE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reuploader_pipeline_failures_total",
            "Total terminal pipeline failures",
        ),
        &["code"],
    )
    .unwrap()
});

/// Jobs that ran out of attempts.
pub static RETRIES_EXHAUSTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reuploader_retries_exhausted_total",
        "Total jobs marked UNKNOWN_FAILURE after exceeding the retry limit",
    )
    .unwrap()
});

// =============================================================================
// Tracker Metrics
// =============================================================================

/// Tracker uploads by tracker and result.
pub static TRACKER_UPLOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("reuploader_tracker_uploads_total", "Total tracker uploads"),
        &["tracker", "result"], // result: "success", "failed", "dupe", "skipped"
    )
    .unwrap()
});

// =============================================================================
// Identity Metrics
// =============================================================================

/// Single-edge ID lookups.
pub static IDENTITY_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reuploader_identity_lookups_total",
            "Total external ID lookups",
        ),
        &["from", "to", "result"], // result: "found", "empty", "error"
    )
    .unwrap()
});

/// Title search fallbacks.
pub static IDENTITY_SEARCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reuploader_identity_searches_total",
            "Total TMDB title search fallbacks",
        ),
        &["result"], // "selected", "ambiguous", "error"
    )
    .unwrap()
});

/// Identity cache reads.
pub static IDENTITY_CACHE: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reuploader_identity_cache_total",
            "Identity cache reads by result",
        ),
        &["result"], // "hit", "miss", "error"
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "reuploader_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reuploader_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Orchestrator
        Box::new(CYCLES_TOTAL.clone()),
        Box::new(CYCLE_DURATION.clone()),
        Box::new(JOBS_PROCESSED.clone()),
        Box::new(PIPELINE_FAILURES.clone()),
        Box::new(RETRIES_EXHAUSTED.clone()),
        // Trackers
        Box::new(TRACKER_UPLOADS.clone()),
        // Identity
        Box::new(IDENTITY_LOOKUPS.clone()),
        Box::new(IDENTITY_SEARCHES.clone()),
        Box::new(IDENTITY_CACHE.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        TRACKER_UPLOADS.with_label_values(&["TSP", "success"]).inc();
        assert!(!registry.gather().is_empty());
    }
}
