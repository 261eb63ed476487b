//! Types for upstream news API responses.

use serde::{Deserialize, Serialize};

/// Ordered list of candidate story ids, as returned by the top-stories call.
pub type CandidateIdSet = Vec<u64>;

/// A single item as the upstream API describes it.
///
/// The upstream omits fields depending on the item type (job posts carry no
/// `descendants`, Ask posts carry no `url`), so everything but `id` is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoryDetail {
    /// Item id.
    pub id: u64,
    /// Author handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    /// Total comment count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descendants: Option<u32>,
    /// Direct child comment ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kids: Vec<u64>,
    /// Story score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    /// Body text (HTML) for text posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Creation time, unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    /// Title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Raw type tag ("story", "job", "poll", ...).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Link target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl StoryDetail {
    /// Score with absent treated as zero.
    pub fn score_or_zero(&self) -> i64 {
        self.score.unwrap_or(0)
    }
}
