//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ContentSummary;

string_enum! {
    /// Moderation state of a comment
    pub enum CommentStatus {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
    }
}

impl Default for CommentStatus {
    fn default() -> Self {
        Self::Approved
    }
}

/// Comment entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub content_id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub email: String,
    pub body: String,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment as shown on the public site, without the author's email
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicComment {
    pub id: i64,
    pub content_id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub replies: Vec<PublicComment>,
}

impl From<Comment> for PublicComment {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            content_id: comment.content_id,
            parent_id: comment.parent_id,
            name: comment.name,
            body: comment.body,
            created_at: comment.created_at,
            replies: Vec::new(),
        }
    }
}

/// Comment joined with its content, for moderation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminComment {
    #[serde(flatten)]
    pub comment: Comment,
    pub content: ContentSummary,
}

/// One page of the moderation list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub comments: Vec<AdminComment>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

/// Public comment submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    pub content_slug: Option<String>,
    pub parent_id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub body: Option<String>,
}

impl CreateCommentInput {
    pub fn new(
        content_slug: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            content_slug: Some(content_slug.into()),
            parent_id: None,
            name: Some(name.into()),
            email: Some(email.into()),
            body: Some(body.into()),
        }
    }

    pub fn reply_to(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}
