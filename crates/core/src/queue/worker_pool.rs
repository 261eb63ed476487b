//! In-process job queue backed by a semaphore-bounded worker pool.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock, Semaphore};
use tracing::{debug, error, warn};

use super::types::{JobError, JobHandle, JobInfo, JobState, QueueStatus, UnitOfWork};
use super::{JobQueue, JobRunner};
use crate::config::QueueConfig;
use crate::metrics::{JOBS_FINISHED, JOBS_SUBMITTED, JOB_DURATION, JOB_RETRIES};

/// Tracks statistics for the worker pool.
#[derive(Default)]
struct PoolStats {
    active: AtomicU64,
    queued: AtomicU64,
    total_succeeded: AtomicU64,
    total_failed: AtomicU64,
    retries: AtomicU64,
}

/// Bookkeeping for one submitted job.
#[derive(Debug, Clone)]
struct JobRecord {
    work: UnitOfWork,
    state: JobState,
    attempts: u32,
    last_error: Option<String>,
    submitted_at: DateTime<Utc>,
    finished_at: Option<Instant>,
}

type Records = Arc<RwLock<HashMap<JobHandle, JobRecord>>>;

/// Minimum spacing between two record sweeps triggered by `submit`.
const SUBMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Everything a spawned job task needs.
#[derive(Clone)]
struct Worker {
    queue_name: Arc<str>,
    runner: Arc<dyn JobRunner>,
    permits: Arc<Semaphore>,
    records: Records,
    stats: Arc<PoolStats>,
    retry_attempts: u32,
    retry_delay: Duration,
}

/// Job queue executing units of work on a fixed number of workers.
///
/// Every submission becomes a task that waits in `Pending` for one of
/// `worker_count` permits, runs in `Processing`, and ends `Succeeded` or
/// `Failed`. A failed run is re-attempted up to `retry_attempts` times; the
/// permit is released and the job goes back to `Pending` while it waits
/// `retry_delay_ms`. Finished records are kept for `record_retention_secs`
/// and collected by `purge_finished`, or lazily on submission at most once
/// per second.
pub struct WorkerPoolQueue {
    config: QueueConfig,
    worker: Worker,
    last_sweep: Mutex<Instant>,
}

impl WorkerPoolQueue {
    /// Create a new queue around the given runner.
    pub fn new(config: QueueConfig, runner: Arc<dyn JobRunner>) -> Self {
        let worker = Worker {
            queue_name: Arc::from(config.name.as_str()),
            runner,
            permits: Arc::new(Semaphore::new(config.worker_count)),
            records: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(PoolStats::default()),
            retry_attempts: config.retry_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        };

        Self {
            config,
            worker,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Returns the current queue status.
    pub async fn status(&self) -> QueueStatus {
        let tracked_records = self.worker.records.read().await.len();
        let stats = &self.worker.stats;

        QueueStatus {
            name: self.config.name.clone(),
            worker_count: self.config.worker_count,
            active_jobs: stats.active.load(Ordering::Relaxed) as usize,
            queued_jobs: stats.queued.load(Ordering::Relaxed) as usize,
            total_succeeded: stats.total_succeeded.load(Ordering::Relaxed),
            total_failed: stats.total_failed.load(Ordering::Relaxed),
            retries: stats.retries.load(Ordering::Relaxed),
            tracked_records,
        }
    }

    /// Snapshot of one job, while its record is retained.
    pub async fn job(&self, handle: &JobHandle) -> Option<JobInfo> {
        self.worker
            .records
            .read()
            .await
            .get(handle)
            .map(|r| JobInfo {
                handle: *handle,
                work: r.work,
                state: r.state,
                attempts: r.attempts,
                last_error: r.last_error.clone(),
                submitted_at: r.submitted_at,
            })
    }

    /// Drop finished records older than the retention window.
    pub async fn purge_finished(&self) -> usize {
        let mut records = self.worker.records.write().await;
        purge_expired_records(&mut records, self.retention())
    }

    fn retention(&self) -> Duration {
        Duration::from_secs(self.config.record_retention_secs)
    }

    /// Claim the submit-time sweep if the last one is old enough.
    async fn sweep_due(&self) -> bool {
        let mut last = self.last_sweep.lock().await;
        if last.elapsed() < SUBMIT_SWEEP_INTERVAL {
            return false;
        }
        *last = Instant::now();
        true
    }
}

#[async_trait]
impl JobQueue for WorkerPoolQueue {
    async fn submit(&self, work: UnitOfWork) -> JobHandle {
        let handle = JobHandle::new();
        let sweep = self.sweep_due().await;

        {
            let mut records = self.worker.records.write().await;
            if sweep {
                purge_expired_records(&mut records, self.retention());
            }
            records.insert(
                handle,
                JobRecord {
                    work,
                    state: JobState::Pending,
                    attempts: 0,
                    last_error: None,
                    submitted_at: Utc::now(),
                    finished_at: None,
                },
            );
        }

        JOBS_SUBMITTED.with_label_values(&[work.kind()]).inc();
        debug!(
            "Job {} ({}) enqueued on '{}'",
            handle, work, self.worker.queue_name
        );

        let worker = self.worker.clone();
        tokio::spawn(async move {
            worker.execute(handle, work).await;
        });

        handle
    }

    async fn state(&self, handle: &JobHandle) -> JobState {
        self.worker
            .records
            .read()
            .await
            .get(handle)
            .map(|r| r.state)
            .unwrap_or(JobState::Unknown)
    }
}

impl Worker {
    /// Run a job to its terminal state, re-attempting failed runs.
    async fn execute(self, handle: JobHandle, work: UnitOfWork) {
        let start = Instant::now();
        let max_runs = self.retry_attempts.saturating_add(1);
        let mut attempt = 0;

        let outcome = loop {
            attempt += 1;

            self.stats.queued.fetch_add(1, Ordering::Relaxed);
            let permit = Arc::clone(&self.permits).acquire_owned().await;
            self.stats.queued.fetch_sub(1, Ordering::Relaxed);
            let Ok(permit) = permit else {
                break Err(JobError::PoolClosed);
            };

            self.stats.active.fetch_add(1, Ordering::Relaxed);
            self.update(handle, |r| {
                r.state = JobState::Processing;
                r.attempts = attempt;
            })
            .await;

            let result = self.run_guarded(work).await;

            self.stats.active.fetch_sub(1, Ordering::Relaxed);
            drop(permit);

            match result {
                Ok(()) => break Ok(()),
                Err(e) if attempt < max_runs => {
                    warn!(
                        "Job {} ({}) failed on attempt {}/{}: {}; retrying in {:?}",
                        handle, work, attempt, max_runs, e, self.retry_delay
                    );
                    self.stats.retries.fetch_add(1, Ordering::Relaxed);
                    JOB_RETRIES.with_label_values(&[work.kind()]).inc();

                    let message = e.to_string();
                    self.update(handle, move |r| {
                        r.state = JobState::Pending;
                        r.last_error = Some(message);
                    })
                    .await;

                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => break Err(e),
            }
        };

        JOB_DURATION
            .with_label_values(&[work.kind()])
            .observe(start.elapsed().as_secs_f64());

        match outcome {
            Ok(()) => {
                self.stats.total_succeeded.fetch_add(1, Ordering::Relaxed);
                JOBS_FINISHED
                    .with_label_values(&[work.kind(), "succeeded"])
                    .inc();
                debug!("Job {} ({}) succeeded after {} run(s)", handle, work, attempt);

                self.update(handle, |r| {
                    r.state = JobState::Succeeded;
                    r.finished_at = Some(Instant::now());
                })
                .await;
            }
            Err(e) => {
                self.stats.total_failed.fetch_add(1, Ordering::Relaxed);
                JOBS_FINISHED.with_label_values(&[work.kind(), "failed"]).inc();
                error!("Job {} ({}) failed after {} run(s): {}", handle, work, attempt, e);

                let message = e.to_string();
                self.update(handle, move |r| {
                    r.state = JobState::Failed;
                    r.last_error = Some(message);
                    r.finished_at = Some(Instant::now());
                })
                .await;
            }
        }
    }

    /// Run once, turning a panic in the runner into a failed run.
    async fn run_guarded(&self, work: UnitOfWork) -> Result<(), JobError> {
        let runner = Arc::clone(&self.runner);
        match tokio::spawn(async move { runner.run(&work).await }).await {
            Ok(result) => result,
            Err(join_error) => Err(JobError::Panicked(join_error.to_string())),
        }
    }

    async fn update<F>(&self, handle: JobHandle, f: F)
    where
        F: FnOnce(&mut JobRecord),
    {
        let mut records = self.records.write().await;
        if let Some(record) = records.get_mut(&handle) {
            f(record);
        }
    }
}

fn purge_expired_records(records: &mut HashMap<JobHandle, JobRecord>, retention: Duration) -> usize {
    let before = records.len();
    records.retain(|_, r| match r.finished_at {
        Some(finished_at) => finished_at.elapsed() < retention,
        None => true,
    });
    let removed = before - records.len();
    if removed > 0 {
        debug!("Collected {} finished job records", removed);
    }
    removed
}
