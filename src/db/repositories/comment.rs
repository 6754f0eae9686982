//! Comment repository
//!
//! Visitor comments on content items and the moderation queries over them.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{mysql::MySqlRow, sqlite::SqliteRow, MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::content::{content_summary_from_row, CONTENT_SUMMARY_COLUMNS};
use super::{parse_enum, placeholders};
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{AdminComment, Comment, CommentStatus};

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: &Comment) -> Result<Comment>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// One page of the moderation list, newest first, plus the total count
    async fn list_admin(
        &self,
        status: Option<CommentStatus>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<AdminComment>, i64)>;

    /// Every approved comment of an item, oldest first
    async fn approved_for_content(&self, content_id: i64) -> Result<Vec<Comment>>;

    /// Persist an edited body and status
    async fn update_body_status(&self, id: i64, body: &str, status: CommentStatus) -> Result<bool>;

    /// Returns the number of comments changed
    async fn bulk_update_status(&self, ids: &[i64], status: CommentStatus) -> Result<u64>;

    /// Returns the number of comments deleted
    async fn delete_many(&self, ids: &[i64]) -> Result<u64>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), comment).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), comment).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list_admin(
        &self,
        status: Option<CommentStatus>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<AdminComment>, i64)> {
        let offset = (page.max(1) - 1) * limit;
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_admin_sqlite(self.pool.as_sqlite().unwrap(), status, limit, offset).await
            }
            DatabaseDriver::Mysql => {
                list_admin_mysql(self.pool.as_mysql().unwrap(), status, limit, offset).await
            }
        }
    }

    async fn approved_for_content(&self, content_id: i64) -> Result<Vec<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                approved_for_content_sqlite(self.pool.as_sqlite().unwrap(), content_id).await
            }
            DatabaseDriver::Mysql => {
                approved_for_content_mysql(self.pool.as_mysql().unwrap(), content_id).await
            }
        }
    }

    async fn update_body_status(&self, id: i64, body: &str, status: CommentStatus) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_body_status_sqlite(self.pool.as_sqlite().unwrap(), id, body, status).await
            }
            DatabaseDriver::Mysql => {
                update_body_status_mysql(self.pool.as_mysql().unwrap(), id, body, status).await
            }
        }
    }

    async fn bulk_update_status(&self, ids: &[i64], status: CommentStatus) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                bulk_update_status_sqlite(self.pool.as_sqlite().unwrap(), ids, status).await
            }
            DatabaseDriver::Mysql => {
                bulk_update_status_mysql(self.pool.as_mysql().unwrap(), ids, status).await
            }
        }
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_many_sqlite(self.pool.as_sqlite().unwrap(), ids).await,
            DatabaseDriver::Mysql => delete_many_mysql(self.pool.as_mysql().unwrap(), ids).await,
        }
    }
}

const COMMENT_COLUMNS: &str = "cm.id, cm.content_id, cm.parent_id, cm.name, cm.email, cm.body, \
     cm.status, cm.created_at, cm.updated_at";

const INSERT_COMMENT: &str = r#"
    INSERT INTO comments (content_id, parent_id, name, email, body, status, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

const STATUS_FILTER: &str = "(? IS NULL OR cm.status = ?)";

fn admin_list_sql() -> String {
    format!(
        "SELECT {}, {} FROM comments cm JOIN contents c ON c.id = cm.content_id \
         WHERE {} ORDER BY cm.created_at DESC, cm.id DESC LIMIT ? OFFSET ?",
        COMMENT_COLUMNS, CONTENT_SUMMARY_COLUMNS, STATUS_FILTER
    )
}

fn admin_count_sql() -> String {
    format!("SELECT COUNT(*) FROM comments cm WHERE {}", STATUS_FILTER)
}

fn approved_sql() -> String {
    format!(
        "SELECT {} FROM comments cm WHERE cm.content_id = ? AND cm.status = ? \
         ORDER BY cm.created_at ASC, cm.id ASC",
        COMMENT_COLUMNS
    )
}

macro_rules! comment_from_row {
    ($row:expr) => {{
        let row = $row;
        Ok::<_, anyhow::Error>(Comment {
            id: row.get("id"),
            content_id: row.get("content_id"),
            parent_id: row.get("parent_id"),
            name: row.get("name"),
            email: row.get("email"),
            body: row.get("body"),
            status: parse_enum(row.get::<String, _>("status").as_str())?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }};
}

fn row_to_comment_sqlite(row: &SqliteRow) -> Result<Comment> {
    comment_from_row!(row)
}

fn row_to_comment_mysql(row: &MySqlRow) -> Result<Comment> {
    comment_from_row!(row)
}

fn row_to_admin_comment_sqlite(row: &SqliteRow) -> Result<AdminComment> {
    Ok(AdminComment {
        comment: row_to_comment_sqlite(row)?,
        content: content_summary_from_row!(row)?,
    })
}

fn row_to_admin_comment_mysql(row: &MySqlRow) -> Result<AdminComment> {
    Ok(AdminComment {
        comment: row_to_comment_mysql(row)?,
        content: content_summary_from_row!(row)?,
    })
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, comment: &Comment) -> Result<Comment> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_COMMENT)
        .bind(comment.content_id)
        .bind(comment.parent_id)
        .bind(&comment.name)
        .bind(&comment.email)
        .bind(&comment.body)
        .bind(comment.status.as_str())
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..comment.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let sql = format!("SELECT {} FROM comments cm WHERE cm.id = ?", COMMENT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment by ID")?;

    row.as_ref().map(row_to_comment_sqlite).transpose()
}

async fn list_admin_sqlite(
    pool: &SqlitePool,
    status: Option<CommentStatus>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<AdminComment>, i64)> {
    let status = status.map(|s| s.as_str());

    let total: i64 = sqlx::query_scalar(&admin_count_sql())
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count comments")?;

    let rows = sqlx::query(&admin_list_sql())
        .bind(status)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    let comments = rows
        .iter()
        .map(row_to_admin_comment_sqlite)
        .collect::<Result<Vec<_>>>()?;
    Ok((comments, total))
}

async fn approved_for_content_sqlite(pool: &SqlitePool, content_id: i64) -> Result<Vec<Comment>> {
    let rows = sqlx::query(&approved_sql())
        .bind(content_id)
        .bind(CommentStatus::Approved.as_str())
        .fetch_all(pool)
        .await
        .context("Failed to list approved comments")?;

    rows.iter().map(row_to_comment_sqlite).collect()
}

async fn update_body_status_sqlite(
    pool: &SqlitePool,
    id: i64,
    body: &str,
    status: CommentStatus,
) -> Result<bool> {
    let result = sqlx::query("UPDATE comments SET body = ?, status = ?, updated_at = ? WHERE id = ?")
        .bind(body)
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update comment")?;

    Ok(result.rows_affected() > 0)
}

async fn bulk_update_status_sqlite(pool: &SqlitePool, ids: &[i64], status: CommentStatus) -> Result<u64> {
    let sql = format!(
        "UPDATE comments SET status = ?, updated_at = ? WHERE id IN ({})",
        placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql).bind(status.as_str()).bind(Utc::now());
    for id in ids {
        query = query.bind(id);
    }
    let result = query
        .execute(pool)
        .await
        .context("Failed to update comment status")?;

    Ok(result.rows_affected())
}

async fn delete_many_sqlite(pool: &SqlitePool, ids: &[i64]) -> Result<u64> {
    let sql = format!("DELETE FROM comments WHERE id IN ({})", placeholders(ids.len()));
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(id);
    }
    let result = query
        .execute(pool)
        .await
        .context("Failed to delete comments")?;

    Ok(result.rows_affected())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, comment: &Comment) -> Result<Comment> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_COMMENT)
        .bind(comment.content_id)
        .bind(comment.parent_id)
        .bind(&comment.name)
        .bind(&comment.email)
        .bind(&comment.body)
        .bind(comment.status.as_str())
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..comment.clone()
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Comment>> {
    let sql = format!("SELECT {} FROM comments cm WHERE cm.id = ?", COMMENT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment by ID")?;

    row.as_ref().map(row_to_comment_mysql).transpose()
}

async fn list_admin_mysql(
    pool: &MySqlPool,
    status: Option<CommentStatus>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<AdminComment>, i64)> {
    let status = status.map(|s| s.as_str());

    let total: i64 = sqlx::query_scalar(&admin_count_sql())
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
        .context("Failed to count comments")?;

    let rows = sqlx::query(&admin_list_sql())
        .bind(status)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    let comments = rows
        .iter()
        .map(row_to_admin_comment_mysql)
        .collect::<Result<Vec<_>>>()?;
    Ok((comments, total))
}

async fn approved_for_content_mysql(pool: &MySqlPool, content_id: i64) -> Result<Vec<Comment>> {
    let rows = sqlx::query(&approved_sql())
        .bind(content_id)
        .bind(CommentStatus::Approved.as_str())
        .fetch_all(pool)
        .await
        .context("Failed to list approved comments")?;

    rows.iter().map(row_to_comment_mysql).collect()
}

async fn update_body_status_mysql(
    pool: &MySqlPool,
    id: i64,
    body: &str,
    status: CommentStatus,
) -> Result<bool> {
    let result = sqlx::query("UPDATE comments SET body = ?, status = ?, updated_at = ? WHERE id = ?")
        .bind(body)
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update comment")?;

    Ok(result.rows_affected() > 0)
}

async fn bulk_update_status_mysql(pool: &MySqlPool, ids: &[i64], status: CommentStatus) -> Result<u64> {
    let sql = format!(
        "UPDATE comments SET status = ?, updated_at = ? WHERE id IN ({})",
        placeholders(ids.len())
    );
    let mut query = sqlx::query(&sql).bind(status.as_str()).bind(Utc::now());
    for id in ids {
        query = query.bind(id);
    }
    let result = query
        .execute(pool)
        .await
        .context("Failed to update comment status")?;

    Ok(result.rows_affected())
}

async fn delete_many_mysql(pool: &MySqlPool, ids: &[i64]) -> Result<u64> {
    let sql = format!("DELETE FROM comments WHERE id IN ({})", placeholders(ids.len()));
    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(id);
    }
    let result = query
        .execute(pool)
        .await
        .context("Failed to delete comments")?;

    Ok(result.rows_affected())
}
