//! Job runner that ingests upstream data into the result cache.
//!
//! - `FetchIds` always refreshes the id list, replacing it wholesale.
//! - `FetchDetail` is satisfied from the cache while a live entry exists, so
//!   concurrent or repeated requests within the TTL reuse warmed details.
//!
//! Nothing is written on upstream error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::{cached_story, CacheKey, CachedValue, ResultCache};
use crate::queue::{JobError, JobRunner, UnitOfWork};
use crate::upstream::Upstream;

/// Runs fetch jobs against the upstream and stores results in the cache.
pub struct IngestRunner {
    upstream: Arc<dyn Upstream>,
    cache: Arc<dyn ResultCache>,
    ttl: Duration,
}

impl IngestRunner {
    pub fn new(upstream: Arc<dyn Upstream>, cache: Arc<dyn ResultCache>, ttl: Duration) -> Self {
        Self {
            upstream,
            cache,
            ttl,
        }
    }

    async fn ingest_ids(&self) -> Result<(), JobError> {
        let ids = self.upstream.fetch_ids().await?;
        debug!("Caching {} top story ids", ids.len());
        self.cache
            .set(CacheKey::TopIds, CachedValue::Ids(ids), self.ttl);
        Ok(())
    }

    async fn ingest_detail(&self, id: u64) -> Result<(), JobError> {
        if cached_story(self.cache.as_ref(), id).is_some() {
            debug!("Story {} already cached", id);
            return Ok(());
        }

        let detail = self.upstream.fetch_detail(id).await?;
        self.cache
            .set(CacheKey::Story(id), CachedValue::Story(detail), self.ttl);
        Ok(())
    }
}

#[async_trait]
impl JobRunner for IngestRunner {
    async fn run(&self, work: &UnitOfWork) -> Result<(), JobError> {
        match *work {
            UnitOfWork::FetchIds => self.ingest_ids().await,
            UnitOfWork::FetchDetail { id } => self.ingest_detail(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{cached_ids, MemoryCache};
    use crate::testing::{fixtures, MockUpstream};

    fn runner(upstream: Arc<MockUpstream>, cache: Arc<MemoryCache>) -> IngestRunner {
        IngestRunner::new(upstream, cache, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_fetch_ids_writes_cache() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.set_ids(vec![3, 1, 2]).await;
        let cache = Arc::new(MemoryCache::new());

        runner(upstream, cache.clone())
            .run(&UnitOfWork::FetchIds)
            .await
            .unwrap();

        assert_eq!(cached_ids(cache.as_ref()), Some(vec![3, 1, 2]));
    }

    #[tokio::test]
    async fn test_fetch_detail_writes_cache() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.add_story(fixtures::story(5, "Five", 50)).await;
        let cache = Arc::new(MemoryCache::new());

        runner(upstream, cache.clone())
            .run(&UnitOfWork::FetchDetail { id: 5 })
            .await
            .unwrap();

        let detail = cached_story(cache.as_ref(), 5).unwrap();
        assert_eq!(detail.title.as_deref(), Some("Five"));
    }

    #[tokio::test]
    async fn test_cached_detail_skips_upstream() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.add_story(fixtures::story(5, "Five", 50)).await;
        let cache = Arc::new(MemoryCache::new());
        let runner = runner(upstream.clone(), cache);

        runner.run(&UnitOfWork::FetchDetail { id: 5 }).await.unwrap();
        runner.run(&UnitOfWork::FetchDetail { id: 5 }).await.unwrap();

        assert_eq!(upstream.detail_calls().await, vec![5]);
    }

    #[tokio::test]
    async fn test_upstream_error_leaves_cache_untouched() {
        let upstream = Arc::new(MockUpstream::new());
        upstream.fail_ids(true).await;
        let cache = Arc::new(MemoryCache::new());
        let runner = runner(upstream, cache.clone());

        let ids = runner.run(&UnitOfWork::FetchIds).await;
        assert!(matches!(ids, Err(JobError::Upstream(_))));

        let detail = runner.run(&UnitOfWork::FetchDetail { id: 99 }).await;
        assert!(matches!(detail, Err(JobError::Upstream(_))));

        assert!(cache.is_empty());
    }
}
