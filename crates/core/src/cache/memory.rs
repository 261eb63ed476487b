//! In-process cache backed by a sharded concurrent map.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use super::{CacheKey, CachedValue, ResultCache};

struct Entry {
    value: CachedValue,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory result cache.
///
/// Expiry is passive: a read of an expired entry evicts it and reports a
/// miss. `purge_expired` sweeps the whole map.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<CacheKey, Entry>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!("Purged {} expired cache entries", removed);
        }
        removed
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultCache for MemoryCache {
    fn set(&self, key: CacheKey, value: CachedValue, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.entries.insert(key, Entry { value, expires_at });
    }

    fn get(&self, key: CacheKey) -> Option<CachedValue> {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(&key) {
            if !entry.is_expired(now) {
                return Some(entry.value.clone());
            }
        }

        // Expired: evict unless a writer replaced it in the meantime.
        self.entries.remove_if(&key, |_, entry| entry.is_expired(now));
        None
    }
}
