//! Mock upstream for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::upstream::{CandidateIdSet, StoryDetail, Upstream, UpstreamError};

/// Mock implementation of the Upstream trait.
///
/// Provides controllable behavior for testing:
/// - Return a configurable id list and story details
/// - Fail the id call or individual detail calls
/// - Delay the id call or individual detail calls
/// - Record every call for assertions
///
/// # Example
///
/// ```rust,ignore
/// use topstories_core::testing::{MockUpstream, fixtures};
///
/// let upstream = MockUpstream::new();
/// upstream.set_ids(vec![1, 2]).await;
/// upstream.add_story(fixtures::story(1, "First", 10)).await;
/// upstream.fail_detail(2).await;
///
/// assert!(upstream.fetch_detail(2).await.is_err());
/// assert_eq!(upstream.detail_calls().await, vec![2]);
/// ```
#[derive(Debug, Default)]
pub struct MockUpstream {
    ids: Arc<RwLock<CandidateIdSet>>,
    stories: Arc<RwLock<HashMap<u64, StoryDetail>>>,
    fail_ids: Arc<RwLock<bool>>,
    ids_delay: Arc<RwLock<Option<Duration>>>,
    failing_details: Arc<RwLock<HashSet<u64>>>,
    delays: Arc<RwLock<HashMap<u64, Duration>>>,
    id_calls: Arc<RwLock<usize>>,
    detail_calls: Arc<RwLock<Vec<u64>>>,
}

impl MockUpstream {
    /// Create a mock with no ids and no stories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the id list returned by `fetch_ids`.
    pub async fn set_ids(&self, ids: Vec<u64>) {
        *self.ids.write().await = ids;
    }

    /// Add (or replace) a story returned by `fetch_detail`.
    pub async fn add_story(&self, story: StoryDetail) {
        self.stories.write().await.insert(story.id, story);
    }

    /// Set the id list and add every story in one go.
    pub async fn set_stories(&self, stories: Vec<StoryDetail>) {
        *self.ids.write().await = stories.iter().map(|s| s.id).collect();
        let mut map = self.stories.write().await;
        map.clear();
        map.extend(stories.into_iter().map(|s| (s.id, s)));
    }

    /// Make `fetch_ids` fail (or succeed again).
    pub async fn fail_ids(&self, fail: bool) {
        *self.fail_ids.write().await = fail;
    }

    /// Delay every `fetch_ids` call.
    pub async fn delay_ids(&self, delay: Duration) {
        *self.ids_delay.write().await = Some(delay);
    }

    /// Make `fetch_detail` fail for one id.
    pub async fn fail_detail(&self, id: u64) {
        self.failing_details.write().await.insert(id);
    }

    /// Delay `fetch_detail` for one id.
    pub async fn delay_detail(&self, id: u64, delay: Duration) {
        self.delays.write().await.insert(id, delay);
    }

    /// Number of `fetch_ids` calls made.
    pub async fn id_calls(&self) -> usize {
        *self.id_calls.read().await
    }

    /// Ids passed to `fetch_detail`, in call order.
    pub async fn detail_calls(&self) -> Vec<u64> {
        self.detail_calls.read().await.clone()
    }

    /// Forget recorded calls.
    pub async fn clear_recorded(&self) {
        *self.id_calls.write().await = 0;
        self.detail_calls.write().await.clear();
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn fetch_ids(&self) -> Result<CandidateIdSet, UpstreamError> {
        *self.id_calls.write().await += 1;

        let delay = *self.ids_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.fail_ids.read().await {
            return Err(UpstreamError::Api {
                status: 503,
                message: "mock id failure".to_string(),
            });
        }

        Ok(self.ids.read().await.clone())
    }

    async fn fetch_detail(&self, id: u64) -> Result<StoryDetail, UpstreamError> {
        self.detail_calls.write().await.push(id);

        let delay = self.delays.read().await.get(&id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_details.read().await.contains(&id) {
            return Err(UpstreamError::Api {
                status: 503,
                message: format!("mock detail failure for {}", id),
            });
        }

        self.stories
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(UpstreamError::NotFound(id))
    }
}
