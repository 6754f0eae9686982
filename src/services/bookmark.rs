//! Bookmark service
//!
//! Visitors are identified by an opaque client-generated id; there are no
//! visitor accounts.

use std::sync::Arc;
use thiserror::Error;

use super::required_text;
use crate::db::repositories::{BookmarkRepository, ContentRepository};
use crate::models::BookmarkWithContent;

#[derive(Debug, Error)]
pub enum BookmarkServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Content not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Bookmark service
pub struct BookmarkService {
    repo: Arc<dyn BookmarkRepository>,
    contents: Arc<dyn ContentRepository>,
}

impl BookmarkService {
    pub fn new(repo: Arc<dyn BookmarkRepository>, contents: Arc<dyn ContentRepository>) -> Self {
        Self { repo, contents }
    }

    pub async fn list(&self, user_id: Option<&str>) -> Result<Vec<BookmarkWithContent>, BookmarkServiceError> {
        let user_id = required_user(user_id)?;
        Ok(self.repo.list_for_user(&user_id).await?)
    }

    /// Add the bookmark, or remove it when present
    ///
    /// Returns whether the content is bookmarked afterwards.
    pub async fn toggle(
        &self,
        user_id: Option<&str>,
        content_id: Option<i64>,
    ) -> Result<bool, BookmarkServiceError> {
        let user_id = required_user(user_id)?;
        let content_id = content_id
            .ok_or_else(|| BookmarkServiceError::Validation("contentId is required".to_string()))?;

        if let Some(existing) = self.repo.find(&user_id, content_id).await? {
            self.repo.delete(existing.id).await?;
            return Ok(false);
        }

        if self.contents.get_by_id(content_id).await?.is_none() {
            return Err(BookmarkServiceError::NotFound);
        }
        self.repo.create(&user_id, content_id).await?;
        Ok(true)
    }
}

fn required_user(user_id: Option<&str>) -> Result<String, BookmarkServiceError> {
    required_text(user_id).ok_or_else(|| BookmarkServiceError::Validation("userId is required".to_string()))
}
