//! Comment service
//!
//! Public comments are published immediately, but links are stripped from
//! the body first. Threads are shown two reply levels deep.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::required_text;
use crate::db::repositories::{CommentRepository, ContentRepository};
use crate::models::{Comment, CommentPage, CommentStatus, CreateCommentInput, PublicComment};

const MIN_BODY_CHARS: usize = 2;
const MAX_BODY_CHARS: usize = 2000;
const DEFAULT_ADMIN_LIMIT: i64 = 20;
const MAX_ADMIN_LIMIT: i64 = 100;

/// Reply levels shown under a top-level comment
const REPLY_DEPTH: usize = 2;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:https?://|www\.)[^\s]+|(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}(?:/[^\s]*)?",
    )
    .expect("valid url regex")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

#[derive(Debug, Error)]
pub enum CommentServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CommentServiceError {
    fn validation(message: &str) -> Self {
        Self::Validation(message.to_string())
    }
}

/// Remove URLs and bare domains, then collapse whitespace
pub fn strip_urls(text: &str) -> String {
    let without_urls = URL_PATTERN.replace_all(text, "");
    WHITESPACE.replace_all(&without_urls, " ").trim().to_string()
}

/// Comment service
pub struct CommentService {
    repo: Arc<dyn CommentRepository>,
    contents: Arc<dyn ContentRepository>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn CommentRepository>, contents: Arc<dyn ContentRepository>) -> Self {
        Self { repo, contents }
    }

    /// Approved thread of a content item, newest top-level comment first
    pub async fn list_public(&self, slug: Option<&str>) -> Result<Vec<PublicComment>, CommentServiceError> {
        let slug = required_text(slug)
            .ok_or_else(|| CommentServiceError::validation("Content slug is required"))?;
        let content = self
            .contents
            .get_by_slug(&slug)
            .await?
            .ok_or_else(|| CommentServiceError::NotFound("Content not found".to_string()))?;

        let approved = self.repo.approved_for_content(content.id).await?;
        Ok(build_thread(approved))
    }

    pub async fn create(&self, input: CreateCommentInput) -> Result<PublicComment, CommentServiceError> {
        let (Some(content_slug), Some(name), Some(email), Some(body)) = (
            required_text(input.content_slug.as_deref()),
            required_text(input.name.as_deref()),
            required_text(input.email.as_deref()),
            input.body.filter(|b| !b.is_empty()),
        ) else {
            return Err(CommentServiceError::validation("Missing required fields"));
        };

        if !EMAIL_PATTERN.is_match(&email) {
            return Err(CommentServiceError::validation("Invalid email format"));
        }
        let length = body.chars().count();
        if !(MIN_BODY_CHARS..=MAX_BODY_CHARS).contains(&length) {
            return Err(CommentServiceError::validation(
                "Comment must be between 2 and 2000 characters",
            ));
        }

        let content = self
            .contents
            .get_by_slug(&content_slug)
            .await?
            .ok_or_else(|| CommentServiceError::NotFound("Content not found".to_string()))?;

        if let Some(parent_id) = input.parent_id {
            let parent = self
                .repo
                .get_by_id(parent_id)
                .await?
                .ok_or_else(|| CommentServiceError::NotFound("Parent comment not found".to_string()))?;
            if parent.content_id != content.id {
                return Err(CommentServiceError::validation(
                    "Parent comment does not belong to this content",
                ));
            }
        }

        let cleaned = strip_urls(body.trim());
        if cleaned.chars().count() < MIN_BODY_CHARS {
            return Err(CommentServiceError::validation(
                "Comment must contain at least 2 characters (URLs are not allowed)",
            ));
        }

        let now = Utc::now();
        let comment = Comment {
            id: 0,
            content_id: content.id,
            parent_id: input.parent_id,
            name,
            email: email.to_lowercase(),
            body: cleaned,
            status: CommentStatus::Approved,
            created_at: now,
            updated_at: now,
        };

        Ok(self.repo.create(&comment).await?.into())
    }

    /// Moderation list, newest first
    pub async fn list_admin(
        &self,
        status: Option<&str>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<CommentPage, CommentServiceError> {
        let status = match status.filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                raw.parse::<CommentStatus>()
                    .map_err(|_| CommentServiceError::validation("Invalid status"))?,
            ),
            None => None,
        };
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let limit = limit
            .filter(|l| (1..=MAX_ADMIN_LIMIT).contains(l))
            .unwrap_or(DEFAULT_ADMIN_LIMIT);

        let (comments, total) = self.repo.list_admin(status, page, limit).await?;
        Ok(CommentPage {
            comments,
            total,
            page,
            total_pages: (total + limit - 1) / limit,
        })
    }

    pub async fn delete_many(&self, ids: Option<&[i64]>) -> Result<u64, CommentServiceError> {
        let ids = required_ids(ids)?;
        Ok(self.repo.delete_many(ids).await?)
    }

    /// Edit one comment, or change the status of many
    ///
    /// A single id together with a body edits that comment; the status is
    /// applied too when it is valid. Anything else is a bulk status change
    /// and requires a valid status. Returns the number of comments updated.
    pub async fn moderate(
        &self,
        ids: Option<&[i64]>,
        status: Option<&str>,
        body: Option<&str>,
    ) -> Result<u64, CommentServiceError> {
        let ids = required_ids(ids)?;
        let status = status.and_then(|s| s.parse::<CommentStatus>().ok());

        if let ([id], Some(body)) = (ids, body) {
            let existing = self
                .repo
                .get_by_id(*id)
                .await?
                .ok_or_else(|| CommentServiceError::NotFound("Comment not found".to_string()))?;
            self.repo
                .update_body_status(*id, body, status.unwrap_or(existing.status))
                .await?;
            return Ok(1);
        }

        let status = status
            .ok_or_else(|| CommentServiceError::validation("Valid status is required for bulk updates"))?;
        Ok(self.repo.bulk_update_status(ids, status).await?)
    }
}

fn required_ids(ids: Option<&[i64]>) -> Result<&[i64], CommentServiceError> {
    ids.filter(|ids| !ids.is_empty())
        .ok_or_else(|| CommentServiceError::validation("Comment IDs are required"))
}

/// Nest approved comments under their parents
///
/// `approved` is oldest first. Top-level comments come out newest first,
/// replies oldest first. Replies deeper than two levels are not shown.
fn build_thread(approved: Vec<Comment>) -> Vec<PublicComment> {
    let mut children: HashMap<i64, Vec<Comment>> = HashMap::new();
    let mut roots = Vec::new();
    for comment in approved {
        match comment.parent_id {
            Some(parent_id) => children.entry(parent_id).or_default().push(comment),
            None => roots.push(comment),
        }
    }

    roots
        .into_iter()
        .rev()
        .map(|root| attach_replies(root, &mut children, REPLY_DEPTH))
        .collect()
}

fn attach_replies(
    comment: Comment,
    children: &mut HashMap<i64, Vec<Comment>>,
    depth: usize,
) -> PublicComment {
    let replies = if depth == 0 {
        Vec::new()
    } else {
        children.remove(&comment.id).unwrap_or_default()
    };

    let mut node = PublicComment::from(comment);
    node.replies = replies
        .into_iter()
        .map(|reply| attach_replies(reply, children, depth - 1))
        .collect();
    node
}
