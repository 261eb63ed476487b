//! Pipeline lifecycle integration tests.
//!
//! These tests run the full request path against a mock upstream:
//! - Ranking and truncation of fetched stories
//! - Partial results when some detail jobs fail or run out of poll budget
//! - Failure modes (id fetch fails, nothing fetched, invalid count)
//! - Cache reuse across requests

use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

use topstories_core::{
    testing::{fixtures, MockUpstream},
    CompletionPoller, IngestRunner, JobState, MemoryCache, PipelineConfig, PipelineError,
    PollPolicy, QueueConfig, RankedStory, StoryPipeline, WorkerPoolQueue,
};

/// Test helper wiring the pipeline to a mock upstream.
struct TestHarness {
    pipeline: StoryPipeline,
    upstream: Arc<MockUpstream>,
    queue: Arc<WorkerPoolQueue>,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_policy(PollPolicy {
            max_attempts: 400,
            interval: Duration::from_millis(5),
        })
    }

    fn with_policy(policy: PollPolicy) -> Self {
        let upstream = Arc::new(MockUpstream::new());
        let cache = Arc::new(MemoryCache::new());
        let runner = Arc::new(IngestRunner::new(
            upstream.clone(),
            cache.clone(),
            Duration::from_secs(60),
        ));
        let queue = Arc::new(WorkerPoolQueue::new(
            QueueConfig {
                worker_count: 4,
                retry_attempts: 1,
                retry_delay_ms: 5,
                ..Default::default()
            },
            runner,
        ));
        let poller = CompletionPoller::new(queue.clone(), policy);
        let pipeline = StoryPipeline::new(
            queue.clone(),
            poller,
            cache,
            PipelineConfig {
                request_timeout_secs: 30,
            },
        );

        Self {
            pipeline,
            upstream,
            queue,
        }
    }

    async fn request(&self, n: i64) -> Result<Vec<RankedStory>, PipelineError> {
        self.pipeline.top_stories(n, &CancellationToken::new()).await
    }
}

fn titles(stories: &[RankedStory]) -> Vec<String> {
    stories.iter().filter_map(|s| s.title.clone()).collect()
}

#[tokio::test]
async fn test_top_n_by_score() {
    let harness = TestHarness::new();
    harness
        .upstream
        .set_stories(fixtures::stories(&[(1, 10), (2, 50), (3, 30)]))
        .await;

    let stories = assert_ok!(harness.request(2).await);

    assert_eq!(titles(&stories), vec!["Story 2", "Story 3"]);
    assert_eq!(stories[0].score, 50);
    assert_eq!(stories[1].score, 30);
}

#[tokio::test]
async fn test_count_larger_than_available_is_capped() {
    let harness = TestHarness::new();
    harness
        .upstream
        .set_stories(fixtures::stories(&[(1, 10), (2, 50), (3, 30)]))
        .await;

    let stories = assert_ok!(harness.request(100).await);

    assert_eq!(titles(&stories), vec!["Story 2", "Story 3", "Story 1"]);
}

#[tokio::test]
async fn test_slow_detail_is_left_out() {
    let harness = TestHarness::with_policy(PollPolicy {
        max_attempts: 10,
        interval: Duration::from_millis(10),
    });
    harness
        .upstream
        .set_stories(fixtures::stories(&[(1, 10), (2, 50), (3, 30)]))
        .await;
    harness
        .upstream
        .delay_detail(2, Duration::from_secs(2))
        .await;

    let stories = assert_ok!(harness.request(3).await);

    assert_eq!(titles(&stories), vec!["Story 3", "Story 1"]);
}

#[tokio::test]
async fn test_failed_detail_is_left_out() {
    let harness = TestHarness::new();
    harness
        .upstream
        .set_stories(fixtures::stories(&[(1, 10), (2, 50), (3, 30)]))
        .await;
    harness.upstream.fail_detail(3).await;

    let stories = assert_ok!(harness.request(3).await);

    assert_eq!(titles(&stories), vec!["Story 2", "Story 1"]);
}

#[tokio::test]
async fn test_id_fetch_failure_submits_no_details() {
    let harness = TestHarness::new();
    harness
        .upstream
        .set_stories(fixtures::stories(&[(1, 10)]))
        .await;
    harness.upstream.fail_ids(true).await;

    let err = assert_err!(harness.request(5).await);

    assert!(matches!(
        err,
        PipelineError::IdFetch {
            state: JobState::Failed
        }
    ));
    // one run plus one retry
    assert_eq!(harness.upstream.id_calls().await, 2);
    assert!(harness.upstream.detail_calls().await.is_empty());
}

#[tokio::test]
async fn test_id_fetch_out_of_budget_submits_no_details() {
    let harness = TestHarness::with_policy(PollPolicy {
        max_attempts: 3,
        interval: Duration::from_millis(10),
    });
    harness
        .upstream
        .set_stories(fixtures::stories(&[(1, 10), (2, 20)]))
        .await;
    harness
        .upstream
        .delay_ids(Duration::from_millis(500))
        .await;

    let err = assert_err!(harness.request(2).await);

    assert!(matches!(
        err,
        PipelineError::IdFetch {
            state: JobState::Processing
        }
    ));
    assert!(harness.upstream.detail_calls().await.is_empty());
    assert_eq!(harness.queue.status().await.tracked_records, 1);
}

#[tokio::test]
async fn test_repeated_upstream_ids_yield_distinct_stories() {
    let harness = TestHarness::new();
    harness.upstream.set_ids(vec![1, 2, 2]).await;
    harness
        .upstream
        .add_story(fixtures::story(1, "Story 1", 10))
        .await;
    harness
        .upstream
        .add_story(fixtures::story(2, "Story 2", 50))
        .await;

    let stories = assert_ok!(harness.request(3).await);

    assert_eq!(titles(&stories), vec!["Story 2", "Story 1"]);
    assert_eq!(harness.queue.status().await.tracked_records, 3);
}

#[tokio::test]
async fn test_all_details_failing() {
    let harness = TestHarness::new();
    harness.upstream.set_ids(vec![1, 2]).await;

    let err = assert_err!(harness.request(2).await);

    assert!(matches!(err, PipelineError::NoDetails { submitted: 2 }));
}

#[tokio::test]
async fn test_non_positive_count_touches_nothing() {
    let harness = TestHarness::new();

    for n in [0, -1, i64::MIN] {
        let err = assert_err!(harness.request(n).await);
        assert!(matches!(err, PipelineError::Validation(_)));
        assert!(!err.is_retryable());
    }

    assert_eq!(harness.upstream.id_calls().await, 0);
    assert_eq!(harness.queue.status().await.total_succeeded, 0);
}

#[tokio::test]
async fn test_repeated_requests_reuse_cached_details() {
    let harness = TestHarness::new();
    harness
        .upstream
        .set_stories(fixtures::stories(&[(1, 10), (2, 50), (3, 30)]))
        .await;

    let first = assert_ok!(harness.request(3).await);
    let second = assert_ok!(harness.request(3).await);

    assert_eq!(first, second);
    assert_eq!(harness.upstream.id_calls().await, 2);

    let mut detail_calls = harness.upstream.detail_calls().await;
    detail_calls.sort_unstable();
    assert_eq!(detail_calls, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_refreshed_id_list_is_used() {
    let harness = TestHarness::new();
    harness
        .upstream
        .set_stories(fixtures::stories(&[(1, 10), (2, 50)]))
        .await;
    assert_ok!(harness.request(5).await);

    harness
        .upstream
        .set_stories(fixtures::stories(&[(7, 70), (8, 80)]))
        .await;
    let stories = assert_ok!(harness.request(5).await);

    assert_eq!(titles(&stories), vec!["Story 8", "Story 7"]);
}

#[tokio::test]
async fn test_concurrent_requests() {
    let harness = Arc::new(TestHarness::new());
    harness
        .upstream
        .set_stories(fixtures::stories(&[(1, 10), (2, 20), (3, 30), (4, 40)]))
        .await;

    let tasks: Vec<_> = (1..=4)
        .map(|n| {
            let harness = Arc::clone(&harness);
            tokio::spawn(async move { harness.request(n).await })
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        let stories = assert_ok!(task.await.unwrap());
        assert_eq!(stories.len(), i + 1);
        assert_eq!(stories[0].score, 40);
    }
}
