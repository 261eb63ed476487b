//! Top-stories request pipeline.
//!
//! One request walks through:
//! 1. validate the requested count
//! 2. enqueue the id fetch and wait for it
//! 3. read the id list from the cache
//! 4. enqueue one detail fetch per id and wait for all of them
//! 5. collect, rank and cut the cached details
//!
//! The whole run is bounded by the configured request timeout. Jobs already
//! submitted keep running when a request is cancelled or times out; only the
//! waiting stops.

mod types;

pub use types::{FanOutSummary, PipelineError, StoryCount, ValidationError};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregator::{self, RankedStory};
use crate::cache::{cached_ids, ResultCache};
use crate::config::PipelineConfig;
use crate::metrics::{PIPELINE_DURATION, PIPELINE_REQUESTS};
use crate::poller::CompletionPoller;
use crate::queue::{JobHandle, JobQueue, JobState, UnitOfWork};

/// Orchestrates queue, poller, cache and aggregator for one request at a time.
///
/// Holds no per-request state; share it behind an `Arc`.
pub struct StoryPipeline {
    queue: Arc<dyn JobQueue>,
    poller: CompletionPoller,
    cache: Arc<dyn ResultCache>,
    config: PipelineConfig,
}

impl StoryPipeline {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        poller: CompletionPoller,
        cache: Arc<dyn ResultCache>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            queue,
            poller,
            cache,
            config,
        }
    }

    /// Return the `requested` highest-scored stories among the current top ids.
    pub async fn top_stories(
        &self,
        requested: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<RankedStory>, PipelineError> {
        let started = Instant::now();
        let result = self.run(requested, cancel).await;

        let label = match &result {
            Ok(_) => "ok",
            Err(e) => e.metric_label(),
        };
        PIPELINE_REQUESTS.with_label_values(&[label]).inc();
        PIPELINE_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        result
    }

    async fn run(
        &self,
        requested: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<RankedStory>, PipelineError> {
        let count = StoryCount::new(requested)?;
        let child = cancel.child_token();
        let deadline = self.config.request_timeout();

        match tokio::time::timeout(deadline, self.execute(count, &child)).await {
            Ok(result) => result,
            Err(_) => {
                child.cancel();
                warn!(
                    "Top stories request for {} timed out after {:?}",
                    count.get(),
                    deadline
                );
                Err(PipelineError::TimedOut)
            }
        }
    }

    async fn execute(
        &self,
        count: StoryCount,
        cancel: &CancellationToken,
    ) -> Result<Vec<RankedStory>, PipelineError> {
        let ids = self.fetch_ids(cancel).await?;
        info!("Fetched {} candidate story ids", ids.len());

        if ids.is_empty() {
            return Err(PipelineError::NoDetails { submitted: 0 });
        }

        let (succeeded, summary) = self.fan_out_details(&ids, cancel).await?;
        info!(
            "Detail fan-out finished: {} submitted, {} succeeded, {} failed, {} timed out",
            summary.submitted, summary.succeeded, summary.failed, summary.timed_out
        );
        if summary.failed > 0 || summary.timed_out > 0 {
            warn!(
                "{} of {} story details are missing from the response",
                summary.failed + summary.timed_out,
                summary.submitted
            );
        }

        let details = aggregator::collect(self.cache.as_ref(), &succeeded);
        if details.is_empty() {
            return Err(PipelineError::NoDetails {
                submitted: summary.submitted,
            });
        }

        let stories = aggregator::limit(aggregator::rank(&details), count.get());
        info!(
            "Returning {} of {} requested stories",
            stories.len(),
            count.get()
        );
        Ok(stories)
    }

    async fn fetch_ids(&self, cancel: &CancellationToken) -> Result<Vec<u64>, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let handle = self.queue.submit(UnitOfWork::FetchIds).await;
        debug!("Submitted id fetch job {}", handle);

        let state = self.poller.await_one(&handle, cancel).await?;
        if state != JobState::Succeeded {
            warn!("Id fetch job {} ended {}", handle, state);
            return Err(PipelineError::IdFetch { state });
        }

        cached_ids(self.cache.as_ref()).ok_or(PipelineError::IdsUnavailable)
    }

    /// Submit one detail job per distinct id and wait for all of them.
    ///
    /// Returns the ids whose job succeeded, in first-seen id order.
    async fn fan_out_details(
        &self,
        ids: &[u64],
        cancel: &CancellationToken,
    ) -> Result<(Vec<u64>, FanOutSummary), PipelineError> {
        let mut seen = HashSet::with_capacity(ids.len());
        let mut submitted: Vec<(u64, JobHandle)> = Vec::with_capacity(ids.len());
        for &id in ids {
            if !seen.insert(id) {
                continue;
            }
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            let handle = self.queue.submit(UnitOfWork::FetchDetail { id }).await;
            submitted.push((id, handle));
        }
        if submitted.len() < ids.len() {
            debug!(
                "Skipped {} repeated ids in the upstream list",
                ids.len() - submitted.len()
            );
        }
        debug!("Submitted {} detail fetch jobs", submitted.len());

        let handles: Vec<JobHandle> = submitted.iter().map(|(_, handle)| *handle).collect();
        let states = self.poller.await_all(&handles, cancel).await?;

        let mut summary = FanOutSummary {
            submitted: submitted.len(),
            ..Default::default()
        };
        let mut succeeded = Vec::with_capacity(submitted.len());

        for (id, handle) in &submitted {
            match states.get(handle) {
                Some(JobState::Succeeded) => {
                    summary.succeeded += 1;
                    succeeded.push(*id);
                }
                Some(JobState::Failed) => {
                    summary.failed += 1;
                    debug!("Detail job for story {} failed", id);
                }
                _ => {
                    summary.timed_out += 1;
                    debug!("Detail job for story {} did not finish in time", id);
                }
            }
        }

        Ok((succeeded, summary))
    }
}
