//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! wired to a mock upstream, so the full request path (router, pipeline,
//! worker pool, poller, cache) runs without network access.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use topstories_core::{
    testing::MockUpstream, CompletionPoller, Config, IngestRunner, MemoryCache, PipelineConfig,
    PollerConfig, QueueConfig, StoryPipeline, WorkerPoolQueue,
};
use topstories_server::{create_router, AppState};

/// Re-export fixtures for test convenience
pub use topstories_core::testing::fixtures;

/// Test fixture for E2E testing with a mock upstream.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_top_stories() {
///     let fixture = TestFixture::new().await;
///     fixture.upstream.set_stories(fixtures::stories(&[(1, 10)])).await;
///
///     let response = fixture.get("/api/v1/hacker-news/1").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock upstream - configure ids, details, failures and delays
    pub upstream: Arc<MockUpstream>,
    /// Server shutdown token
    pub shutdown: CancellationToken,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with fast polling.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let config = Config {
            queue: QueueConfig {
                worker_count: 4,
                retry_attempts: test_config.retry_attempts,
                retry_delay_ms: 5,
                ..Default::default()
            },
            poller: PollerConfig {
                interval_ms: test_config.poll_interval_ms,
                max_attempts: test_config.poll_max_attempts,
            },
            pipeline: PipelineConfig {
                request_timeout_secs: test_config.request_timeout_secs,
            },
            ..Default::default()
        };

        let upstream = Arc::new(MockUpstream::new());
        let cache = Arc::new(MemoryCache::new());
        let runner = Arc::new(IngestRunner::new(
            upstream.clone(),
            cache.clone(),
            Duration::from_secs(60),
        ));
        let queue = Arc::new(WorkerPoolQueue::new(config.queue.clone(), runner));
        let poller = CompletionPoller::new(queue.clone(), (&config.poller).into());
        let pipeline = Arc::new(StoryPipeline::new(
            queue.clone(),
            poller,
            cache.clone(),
            config.pipeline.clone(),
        ));

        let shutdown = CancellationToken::new();
        let state = Arc::new(AppState::new(
            config,
            pipeline,
            queue,
            cache,
            shutdown.clone(),
        ));

        Self {
            router: create_router(state),
            upstream,
            shutdown,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            text,
        }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub retry_attempts: u32,
    pub poll_interval_ms: u64,
    pub poll_max_attempts: u32,
    pub request_timeout_secs: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 0,
            poll_interval_ms: 5,
            poll_max_attempts: 400,
            request_timeout_secs: 30,
        }
    }
}

impl TestConfig {
    /// Small poll budget, so slow jobs are given up on quickly.
    pub fn with_short_poll_budget() -> Self {
        Self {
            poll_interval_ms: 10,
            poll_max_attempts: 10,
            ..Default::default()
        }
    }

    /// One second request deadline with a poll budget that outlasts it.
    pub fn with_short_request_timeout() -> Self {
        Self {
            poll_interval_ms: 10,
            poll_max_attempts: 10_000,
            request_timeout_secs: 1,
            ..Default::default()
        }
    }
}
