//! Upstream news API gateway.
//!
//! Two read-only calls: the list of top story ids and one item's detail.
//! Calls are never retried here; retry policy belongs to whoever dispatches
//! the job that wraps the call.

mod hacker_news;
mod types;

pub use hacker_news::HackerNewsClient;
pub use types::{CandidateIdSet, StoryDetail};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the upstream API.
///
/// Whatever the variant, the caller must not cache a value.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The upstream answered `null` for this item (deleted or never existed).
    #[error("Item not found: {0}")]
    NotFound(u64),
}

/// Trait for the upstream news source.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Fetch the ordered list of top story ids.
    async fn fetch_ids(&self) -> Result<CandidateIdSet, UpstreamError>;

    /// Fetch a single story's detail.
    async fn fetch_detail(&self, id: u64) -> Result<StoryDetail, UpstreamError>;
}
