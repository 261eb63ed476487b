//! Types for the job queue.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::upstream::UpstreamError;

/// Opaque token identifying one submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(Uuid);

impl JobHandle {
    /// Generate a fresh handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of work the queue can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnitOfWork {
    /// Fetch the top story id list and cache it.
    FetchIds,
    /// Fetch one story's detail and cache it.
    FetchDetail { id: u64 },
}

impl UnitOfWork {
    /// Short kind label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UnitOfWork::FetchIds => "fetch_ids",
            UnitOfWork::FetchDetail { .. } => "fetch_detail",
        }
    }
}

impl fmt::Display for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitOfWork::FetchIds => write!(f, "fetch_ids"),
            UnitOfWork::FetchDetail { id } => write!(f, "fetch_detail({})", id),
        }
    }
}

/// Observable state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting for a worker (initially, or between re-attempts).
    Pending,
    /// Running on a worker.
    Processing,
    Succeeded,
    Failed,
    /// Handle not found, or the record was already collected.
    Unknown,
}

impl JobState {
    /// Succeeded and Failed are terminal; no further transition is expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Processing => "processing",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
            JobState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a single run of a unit of work.
#[derive(Debug, Error)]
pub enum JobError {
    /// The upstream call failed.
    #[error("upstream call failed: {0}")]
    Upstream(#[from] UpstreamError),

    /// The run panicked.
    #[error("job panicked: {0}")]
    Panicked(String),

    /// The worker pool shut down before the job could run.
    #[error("worker pool closed")]
    PoolClosed,
}

/// Snapshot of one job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub handle: JobHandle,
    pub work: UnitOfWork,
    pub state: JobState,
    /// Runs started so far (1 + re-attempts).
    pub attempts: u32,
    /// Error of the most recent failed run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// Snapshot of the queue for status reporting.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Queue name.
    pub name: String,
    /// Fixed worker pool size.
    pub worker_count: usize,
    /// Jobs currently running on a worker.
    pub active_jobs: usize,
    /// Jobs waiting for a worker.
    pub queued_jobs: usize,
    /// Jobs that ended Succeeded since startup.
    pub total_succeeded: u64,
    /// Jobs that ended Failed since startup.
    pub total_failed: u64,
    /// Re-attempts performed since startup.
    pub retries: u64,
    /// Job records currently held (finished records until collected).
    pub tracked_records: usize,
}
