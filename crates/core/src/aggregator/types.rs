//! Response projection of a story.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::upstream::StoryDetail;

/// A story as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedStory {
    pub title: Option<String>,
    pub uri: Option<String>,
    pub posted_by: Option<String>,
    pub time: DateTime<Utc>,
    pub score: i64,
    pub comment_count: u32,
}

impl From<&StoryDetail> for RankedStory {
    fn from(detail: &StoryDetail) -> Self {
        let time = detail
            .time
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_default();

        Self {
            title: detail.title.clone(),
            uri: detail.url.clone(),
            posted_by: detail.by.clone(),
            time,
            score: detail.score_or_zero(),
            comment_count: detail.descendants.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_projection_renames_fields() {
        let mut detail = fixtures::story(8863, "Dropbox", 111);
        detail.by = Some("dhouston".to_string());
        detail.descendants = Some(71);
        detail.time = Some(1175714200);

        let ranked = RankedStory::from(&detail);
        assert_eq!(ranked.title.as_deref(), Some("Dropbox"));
        assert_eq!(ranked.uri.as_deref(), Some("https://example.com/8863"));
        assert_eq!(ranked.posted_by.as_deref(), Some("dhouston"));
        assert_eq!(ranked.score, 111);
        assert_eq!(ranked.comment_count, 71);
        assert_eq!(ranked.time.to_rfc3339(), "2007-04-04T19:16:40+00:00");
    }

    #[test]
    fn test_missing_counts_default_to_zero() {
        let mut detail = fixtures::story(1, "Job post", 0);
        detail.score = None;
        detail.descendants = None;
        detail.time = None;

        let ranked = RankedStory::from(&detail);
        assert_eq!(ranked.score, 0);
        assert_eq!(ranked.comment_count, 0);
        assert_eq!(ranked.time.timestamp(), 0);
    }

    #[test]
    fn test_serializes_camel_case() {
        let ranked = RankedStory::from(&fixtures::story(3, "Three", 30));
        let json = serde_json::to_value(&ranked).unwrap();

        assert_eq!(json["postedBy"], "user3");
        assert_eq!(json["commentCount"], 3);
        assert_eq!(json["uri"], "https://example.com/3");
        assert!(json["time"].as_str().unwrap().starts_with("2023-11-14T"));
        assert!(json.get("posted_by").is_none());
    }
}
