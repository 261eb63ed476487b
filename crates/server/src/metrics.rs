//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the top stories server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Worker pool and cache occupancy (collected dynamically)
//! - Core queue, poller, pipeline and upstream metrics (registered from the core crate)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

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
            "topstories_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 120.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("topstories_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "topstories_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Worker Pool Metrics (collected dynamically)
// =============================================================================

/// Jobs running on a worker.
pub static QUEUE_ACTIVE_JOBS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("topstories_queue_active_jobs", "Number of jobs running on a worker")
        .unwrap()
});

/// Jobs waiting for a worker.
pub static QUEUE_QUEUED_JOBS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("topstories_queue_queued_jobs", "Number of jobs waiting for a worker")
        .unwrap()
});

/// Job records held by the queue.
pub static QUEUE_TRACKED_RECORDS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "topstories_queue_tracked_records",
        "Number of job records held (including finished, not yet collected)",
    )
    .unwrap()
});

// =============================================================================
// Cache Metrics (collected dynamically)
// =============================================================================

/// Live cache entries.
pub static CACHE_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("topstories_cache_entries", "Number of live result cache entries").unwrap()
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

    // Worker pool
    registry
        .register(Box::new(QUEUE_ACTIVE_JOBS.clone()))
        .unwrap();
    registry
        .register(Box::new(QUEUE_QUEUED_JOBS.clone()))
        .unwrap();
    registry
        .register(Box::new(QUEUE_TRACKED_RECORDS.clone()))
        .unwrap();

    // Cache
    registry.register(Box::new(CACHE_ENTRIES.clone())).unwrap();

    // Core metrics (queue, poller, pipeline, upstream)
    for metric in topstories_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the worker pool and cache at scrape time.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.queue().status().await;
    QUEUE_ACTIVE_JOBS.set(status.active_jobs as i64);
    QUEUE_QUEUED_JOBS.set(status.queued_jobs as i64);
    QUEUE_TRACKED_RECORDS.set(status.tracked_records as i64);

    let cache = state.cache();
    cache.purge_expired();
    CACHE_ENTRIES.set(cache.len() as i64);
}

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/-?\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_SEGMENT.replace_all(path, "{id}");
    let result = NUMERIC_SEGMENT.replace_all(&result, "/{id}$1");
    result.to_string()
}
