//! Aggregation of cached story details into the response list.
//!
//! Three pure steps: collect from the cache, rank by score, cut to size.

mod types;

pub use types::RankedStory;

use crate::cache::{cached_story, ResultCache};
use crate::upstream::StoryDetail;

/// Read the cached detail for each id, in id order, skipping misses.
pub fn collect(cache: &dyn ResultCache, ids: &[u64]) -> Vec<StoryDetail> {
    ids.iter()
        .filter_map(|&id| cached_story(cache, id))
        .collect()
}

/// Project and sort by score, highest first. Equal scores keep their input order.
pub fn rank(details: &[StoryDetail]) -> Vec<RankedStory> {
    let mut ranked: Vec<RankedStory> = details.iter().map(RankedStory::from).collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

/// First `n` stories, or all of them when fewer are available.
pub fn limit(mut ranked: Vec<RankedStory>, n: usize) -> Vec<RankedStory> {
    ranked.truncate(n);
    ranked
}
