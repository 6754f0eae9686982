//! Bookmark repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{mysql::MySqlRow, sqlite::SqliteRow, MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::content::{content_summary_from_row, CONTENT_SUMMARY_COLUMNS};
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Bookmark, BookmarkWithContent};

/// Bookmark repository trait
#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    async fn find(&self, user_id: &str, content_id: i64) -> Result<Option<Bookmark>>;

    async fn create(&self, user_id: &str, content_id: i64) -> Result<Bookmark>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// A visitor's bookmarks, newest first
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<BookmarkWithContent>>;
}

/// SQLx-based bookmark repository implementation
pub struct SqlxBookmarkRepository {
    pool: DynDatabasePool,
}

impl SqlxBookmarkRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BookmarkRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl BookmarkRepository for SqlxBookmarkRepository {
    async fn find(&self, user_id: &str, content_id: i64) -> Result<Option<Bookmark>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                find_sqlite(self.pool.as_sqlite().unwrap(), user_id, content_id).await
            }
            DatabaseDriver::Mysql => {
                find_mysql(self.pool.as_mysql().unwrap(), user_id, content_id).await
            }
        }
    }

    async fn create(&self, user_id: &str, content_id: i64) -> Result<Bookmark> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_sqlite(self.pool.as_sqlite().unwrap(), user_id, content_id).await
            }
            DatabaseDriver::Mysql => {
                create_mysql(self.pool.as_mysql().unwrap(), user_id, content_id).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<BookmarkWithContent>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_for_user_sqlite(self.pool.as_sqlite().unwrap(), user_id).await
            }
            DatabaseDriver::Mysql => {
                list_for_user_mysql(self.pool.as_mysql().unwrap(), user_id).await
            }
        }
    }
}

const SELECT_BOOKMARK: &str =
    "SELECT b.id, b.user_id, b.content_id, b.created_at FROM bookmarks b WHERE b.user_id = ? AND b.content_id = ?";

fn list_sql() -> String {
    format!(
        "SELECT b.id, b.user_id, b.content_id, b.created_at, {} FROM bookmarks b \
         JOIN contents c ON c.id = b.content_id \
         WHERE b.user_id = ? ORDER BY b.created_at DESC, b.id DESC",
        CONTENT_SUMMARY_COLUMNS
    )
}

macro_rules! bookmark_from_row {
    ($row:expr) => {{
        let row = $row;
        Bookmark {
            id: row.get("id"),
            user_id: row.get("user_id"),
            content_id: row.get("content_id"),
            created_at: row.get("created_at"),
        }
    }};
}

fn row_to_bookmark_sqlite(row: &SqliteRow) -> Bookmark {
    bookmark_from_row!(row)
}

fn row_to_bookmark_mysql(row: &MySqlRow) -> Bookmark {
    bookmark_from_row!(row)
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn find_sqlite(pool: &SqlitePool, user_id: &str, content_id: i64) -> Result<Option<Bookmark>> {
    let row = sqlx::query(SELECT_BOOKMARK)
        .bind(user_id)
        .bind(content_id)
        .fetch_optional(pool)
        .await
        .context("Failed to find bookmark")?;

    Ok(row.as_ref().map(row_to_bookmark_sqlite))
}

async fn create_sqlite(pool: &SqlitePool, user_id: &str, content_id: i64) -> Result<Bookmark> {
    let now = Utc::now();

    let result = sqlx::query("INSERT INTO bookmarks (user_id, content_id, created_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(content_id)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create bookmark")?;

    Ok(Bookmark {
        id: result.last_insert_rowid(),
        user_id: user_id.to_string(),
        content_id,
        created_at: now,
    })
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM bookmarks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete bookmark")?;

    Ok(result.rows_affected() > 0)
}

async fn list_for_user_sqlite(pool: &SqlitePool, user_id: &str) -> Result<Vec<BookmarkWithContent>> {
    let rows = sqlx::query(&list_sql())
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list bookmarks")?;

    rows.iter()
        .map(|row| -> Result<BookmarkWithContent> {
            Ok(BookmarkWithContent {
                bookmark: row_to_bookmark_sqlite(row),
                content: content_summary_from_row!(row)?,
            })
        })
        .collect()
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn find_mysql(pool: &MySqlPool, user_id: &str, content_id: i64) -> Result<Option<Bookmark>> {
    let row = sqlx::query(SELECT_BOOKMARK)
        .bind(user_id)
        .bind(content_id)
        .fetch_optional(pool)
        .await
        .context("Failed to find bookmark")?;

    Ok(row.as_ref().map(row_to_bookmark_mysql))
}

async fn create_mysql(pool: &MySqlPool, user_id: &str, content_id: i64) -> Result<Bookmark> {
    let now = Utc::now();

    let result = sqlx::query("INSERT INTO bookmarks (user_id, content_id, created_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(content_id)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create bookmark")?;

    Ok(Bookmark {
        id: result.last_insert_id() as i64,
        user_id: user_id.to_string(),
        content_id,
        created_at: now,
    })
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM bookmarks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete bookmark")?;

    Ok(result.rows_affected() > 0)
}

async fn list_for_user_mysql(pool: &MySqlPool, user_id: &str) -> Result<Vec<BookmarkWithContent>> {
    let rows = sqlx::query(&list_sql())
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("Failed to list bookmarks")?;

    rows.iter()
        .map(|row| -> Result<BookmarkWithContent> {
            Ok(BookmarkWithContent {
                bookmark: row_to_bookmark_mysql(row),
                content: content_summary_from_row!(row)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_content, migrated_pool};

    #[tokio::test]
    async fn test_create_find_list_delete() {
        let pool = migrated_pool().await;
        let repo = SqlxBookmarkRepository::new(pool.clone());
        let first = insert_content(&pool, "dandadan").await;
        let second = insert_content(&pool, "chainsaw-man").await;

        assert!(repo.find("visitor-1", first.id).await.unwrap().is_none());

        let created = repo.create("visitor-1", first.id).await.unwrap();
        repo.create("visitor-1", second.id).await.unwrap();
        repo.create("visitor-2", second.id).await.unwrap();

        let found = repo.find("visitor-1", first.id).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);

        let listed = repo.list_for_user("visitor-1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].content.slug, "chainsaw-man");

        assert!(repo.create("visitor-1", first.id).await.is_err());

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.find("visitor-1", first.id).await.unwrap().is_none());
    }
}
