//! Completion poller - waits for queued jobs by querying their state.
//!
//! Each handle gets its own attempt budget. Running out of budget is a normal
//! outcome: the last observed (non-terminal) state is returned and the caller
//! decides what it means. Waiting is a cooperative sleep raced against a
//! cancellation token.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::PollerConfig;
use crate::metrics::POLL_ATTEMPTS;
use crate::queue::{JobHandle, JobQueue, JobState};

/// Errors from waiting on jobs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PollError {
    /// The caller's cancellation token fired while waiting.
    #[error("polling cancelled")]
    Cancelled,
}

/// Attempt budget and spacing for one poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// State queries allowed per job. Zero is treated as one.
    pub max_attempts: u32,
    /// Suspension between two queries.
    pub interval: Duration,
}

impl From<&PollerConfig> for PollPolicy {
    fn from(config: &PollerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            interval: Duration::from_millis(config.interval_ms),
        }
    }
}

/// Polls a [`JobQueue`] until jobs reach a terminal state.
pub struct CompletionPoller {
    queue: Arc<dyn JobQueue>,
    policy: PollPolicy,
}

impl CompletionPoller {
    pub fn new(queue: Arc<dyn JobQueue>, policy: PollPolicy) -> Self {
        Self { queue, policy }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Wait for one job.
    ///
    /// Returns the terminal state as soon as it is observed, or the last
    /// observed state once the budget is spent.
    pub async fn await_one(
        &self,
        handle: &JobHandle,
        cancel: &CancellationToken,
    ) -> Result<JobState, PollError> {
        let budget = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(PollError::Cancelled);
            }

            attempt += 1;
            let state = self.queue.state(handle).await;

            if state.is_terminal() {
                POLL_ATTEMPTS.with_label_values(&["terminal"]).inc();
                trace!("Job {} is {} after {} attempt(s)", handle, state, attempt);
                return Ok(state);
            }

            if attempt >= budget {
                POLL_ATTEMPTS.with_label_values(&["exhausted"]).inc();
                debug!(
                    "Gave up waiting on job {} after {} attempts (last state: {})",
                    handle, attempt, state
                );
                return Ok(state);
            }

            POLL_ATTEMPTS.with_label_values(&["waiting"]).inc();

            tokio::select! {
                _ = cancel.cancelled() => return Err(PollError::Cancelled),
                _ = tokio::time::sleep(self.policy.interval) => {}
            }
        }
    }

    /// Wait for every job concurrently, each with an independent budget.
    ///
    /// Returns once every handle is terminal or out of budget. Duplicate
    /// handles collapse into one entry.
    pub async fn await_all(
        &self,
        handles: &[JobHandle],
        cancel: &CancellationToken,
    ) -> Result<HashMap<JobHandle, JobState>, PollError> {
        let waits = handles.iter().map(|handle| async move {
            self.await_one(handle, cancel)
                .await
                .map(|state| (*handle, state))
        });

        join_all(waits).await.into_iter().collect()
    }
}
