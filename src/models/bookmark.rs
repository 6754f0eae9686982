//! Bookmark model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ContentSummary;

/// A visitor's saved item. `user_id` is an opaque client identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: i64,
    pub user_id: String,
    pub content_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Bookmark joined with the saved content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkWithContent {
    #[serde(flatten)]
    pub bookmark: Bookmark,
    pub content: ContentSummary,
}
