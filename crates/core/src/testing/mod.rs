//! Testing utilities and mock implementations.
//!
//! [`MockUpstream`] stands in for the news API so the whole pipeline can be
//! exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use topstories_core::testing::{fixtures, MockUpstream};
//!
//! let upstream = MockUpstream::new();
//! upstream.set_stories(vec![
//!     fixtures::story(1, "First", 10),
//!     fixtures::story(2, "Second", 50),
//! ]).await;
//! ```

mod mock_upstream;

pub use mock_upstream::MockUpstream;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::upstream::StoryDetail;

    /// Create a story with reasonable defaults.
    pub fn story(id: u64, title: &str, score: i64) -> StoryDetail {
        StoryDetail {
            id,
            by: Some(format!("user{}", id)),
            descendants: Some((id % 100) as u32),
            kids: Vec::new(),
            score: Some(score),
            text: None,
            time: Some(1_700_000_000 + id as i64),
            title: Some(title.to_string()),
            kind: Some("story".to_string()),
            url: Some(format!("https://example.com/{}", id)),
        }
    }

    /// Create a numbered story list `(id, score)` with titles "Story {id}".
    pub fn stories(entries: &[(u64, i64)]) -> Vec<StoryDetail> {
        entries
            .iter()
            .map(|&(id, score)| story(id, &format!("Story {}", id), score))
            .collect()
    }
}
