//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job queue (submissions, outcomes, retries, run time)
//! - Completion poller (poll attempts)
//! - Request pipeline (outcomes, duration)
//! - Upstream news API (requests, latency)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Job Queue Metrics
// =============================================================================

/// Jobs submitted by kind.
pub static JOBS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("topstories_jobs_submitted_total", "Total jobs submitted"),
        &["kind"], // "fetch_ids", "fetch_detail"
    )
    .unwrap()
});

/// Jobs reaching a terminal state, by kind and result.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "topstories_jobs_finished_total",
            "Total jobs that reached a terminal state",
        ),
        &["kind", "result"], // result: "succeeded", "failed"
    )
    .unwrap()
});

/// Automatic re-attempts after a failed run.
pub static JOB_RETRIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("topstories_job_retries_total", "Total job re-attempts"),
        &["kind"],
    )
    .unwrap()
});

/// Time from first run to terminal state.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "topstories_job_duration_seconds",
            "Duration of job execution including retries",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Poller Metrics
// =============================================================================

/// State queries issued by the completion poller, by observed outcome.
pub static POLL_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "topstories_poll_attempts_total",
            "Job state queries issued while awaiting completion",
        ),
        &["outcome"], // "terminal", "waiting", "exhausted"
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Top-stories requests by result.
pub static PIPELINE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "topstories_pipeline_requests_total",
            "Top-stories pipeline runs by result",
        ),
        &["result"], // "ok", "invalid", "id_fetch_failed", "ids_unavailable", "no_details", "cancelled", "timed_out"
    )
    .unwrap()
});

/// End-to-end pipeline duration.
pub static PIPELINE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "topstories_pipeline_duration_seconds",
            "Duration of one top-stories pipeline run",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Upstream Metrics
// =============================================================================

/// Upstream API requests by call and result.
pub static UPSTREAM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "topstories_upstream_requests_total",
            "Requests to the upstream news API",
        ),
        &["call", "result"], // call: "top_ids", "item"; result: "success", "error"
    )
    .unwrap()
});

/// Upstream API request latency.
pub static UPSTREAM_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "topstories_upstream_duration_seconds",
            "Upstream news API request duration",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["call"],
    )
    .unwrap()
});

/// All core metrics, for registration in the server's registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Queue
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOB_RETRIES.clone()),
        Box::new(JOB_DURATION.clone()),
        // Poller
        Box::new(POLL_ATTEMPTS.clone()),
        // Pipeline
        Box::new(PIPELINE_REQUESTS.clone()),
        Box::new(PIPELINE_DURATION.clone()),
        // Upstream
        Box::new(UPSTREAM_REQUESTS.clone()),
        Box::new(UPSTREAM_DURATION.clone()),
    ]
}
