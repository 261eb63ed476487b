//! Types for the top-stories pipeline.

use thiserror::Error;

use crate::poller::PollError;
use crate::queue::JobState;

/// Input rejected before any work is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("story count must be positive, got {0}")]
    NonPositiveCount(i64),
}

/// A validated, strictly positive number of stories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoryCount(usize);

impl StoryCount {
    pub fn new(requested: i64) -> Result<Self, ValidationError> {
        if requested <= 0 {
            return Err(ValidationError::NonPositiveCount(requested));
        }
        Ok(Self(usize::try_from(requested).unwrap_or(usize::MAX)))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

/// Errors that end a pipeline run without a story list.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// The id-fetch job did not succeed within its poll budget.
    #[error("top story ids could not be fetched (job ended {state})")]
    IdFetch { state: JobState },

    /// The id-fetch job succeeded but the id list is not in the cache.
    #[error("top story ids are not available")]
    IdsUnavailable,

    /// No detail job succeeded.
    #[error("no story details could be fetched ({submitted} requested)")]
    NoDetails { submitted: usize },

    #[error("request cancelled")]
    Cancelled,

    #[error("request timed out")]
    TimedOut,
}

impl PipelineError {
    /// Whether the same request could succeed if tried again later.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PipelineError::Validation(_))
    }

    /// Label used for the pipeline request metrics.
    pub fn metric_label(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "invalid",
            PipelineError::IdFetch { .. } => "id_fetch_failed",
            PipelineError::IdsUnavailable => "ids_unavailable",
            PipelineError::NoDetails { .. } => "no_details",
            PipelineError::Cancelled => "cancelled",
            PipelineError::TimedOut => "timed_out",
        }
    }
}

impl From<PollError> for PipelineError {
    fn from(err: PollError) -> Self {
        match err {
            PollError::Cancelled => PipelineError::Cancelled,
        }
    }
}

/// Outcome counts of one detail fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutSummary {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Still Pending, Processing or Unknown when the poll budget ran out.
    pub timed_out: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_count_rejects_non_positive() {
        assert_eq!(
            StoryCount::new(0),
            Err(ValidationError::NonPositiveCount(0))
        );
        assert_eq!(
            StoryCount::new(-3),
            Err(ValidationError::NonPositiveCount(-3))
        );
        assert_eq!(StoryCount::new(1).unwrap().get(), 1);
        assert_eq!(StoryCount::new(500).unwrap().get(), 500);
    }

    #[test]
    fn test_retryable() {
        let invalid = PipelineError::from(ValidationError::NonPositiveCount(0));
        assert!(!invalid.is_retryable());
        assert!(PipelineError::IdsUnavailable.is_retryable());
        assert!(PipelineError::TimedOut.is_retryable());
        assert!(PipelineError::IdFetch {
            state: JobState::Failed
        }
        .is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = PipelineError::IdFetch {
            state: JobState::Processing,
        };
        assert_eq!(
            err.to_string(),
            "top story ids could not be fetched (job ended processing)"
        );

        let err = PipelineError::from(ValidationError::NonPositiveCount(-1));
        assert_eq!(
            err.to_string(),
            "invalid request: story count must be positive, got -1"
        );
    }

    #[test]
    fn test_poll_cancel_maps_to_cancelled() {
        let err = PipelineError::from(PollError::Cancelled);
        assert_eq!(err.metric_label(), "cancelled");
    }
}
