//! Result cache - time-bounded storage for the id list and story details.
//!
//! Workers write into the cache; the pipeline and aggregator only read.
//! Every entry expires independently, and an expired entry reads as a miss.

mod memory;

pub use memory::MemoryCache;

use std::fmt;
use std::time::Duration;

use crate::upstream::{CandidateIdSet, StoryDetail};

/// Cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The current top story id list.
    TopIds,
    /// One story's detail.
    Story(u64),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::TopIds => write!(f, "Ids"),
            CacheKey::Story(id) => write!(f, "Detail_{}", id),
        }
    }
}

/// Cached value.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Ids(CandidateIdSet),
    Story(StoryDetail),
}

/// Trait for result cache storage.
///
/// Writes are keyed and independent: no cross-key transactions and no
/// read-modify-write.
pub trait ResultCache: Send + Sync {
    /// Store a value, replacing any previous value under the same key.
    fn set(&self, key: CacheKey, value: CachedValue, ttl: Duration);

    /// Read a live value. Expired entries behave exactly like misses.
    fn get(&self, key: CacheKey) -> Option<CachedValue>;
}

/// Read the cached top story id list.
pub fn cached_ids(cache: &dyn ResultCache) -> Option<CandidateIdSet> {
    match cache.get(CacheKey::TopIds)? {
        CachedValue::Ids(ids) => Some(ids),
        CachedValue::Story(_) => None,
    }
}

/// Read one cached story detail.
pub fn cached_story(cache: &dyn ResultCache, id: u64) -> Option<StoryDetail> {
    match cache.get(CacheKey::Story(id))? {
        CachedValue::Story(detail) => Some(detail),
        CachedValue::Ids(_) => None,
    }
}
