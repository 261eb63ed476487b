//! Job queue for background fetch work.
//!
//! Callers submit a [`UnitOfWork`] and get back a [`JobHandle`]; execution is
//! asynchronous on a fixed-size worker pool and its progress is observed only
//! by querying [`JobState`]. There is no completion callback and no cancel
//! primitive: once submitted, a job runs to its terminal state.
//!
//! The queue does not know what a unit of work does. Execution is delegated
//! to an injected [`JobRunner`].

mod types;
mod worker_pool;

pub use types::{JobError, JobHandle, JobInfo, JobState, QueueStatus, UnitOfWork};
pub use worker_pool::WorkerPoolQueue;

use async_trait::async_trait;

/// Trait for job queues.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Submit a unit of work. Returns immediately; the job runs in the background.
    async fn submit(&self, work: UnitOfWork) -> JobHandle;

    /// Current state of a job. Unknown handles report [`JobState::Unknown`].
    async fn state(&self, handle: &JobHandle) -> JobState;
}

/// Executes one run of a unit of work.
///
/// Called once per attempt; the queue decides whether a failed run is
/// re-attempted.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, work: &UnitOfWork) -> Result<(), JobError>;
}
