//! Content repository
//!
//! Database operations for catalog items and their category assignments.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{mysql::MySqlRow, sqlite::SqliteRow, MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::category::category_from_row;
use super::{parse_enum, placeholders};
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Category, Content, ContentSort, ContentStatus, PublicContentQuery};

/// Content repository trait
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Insert a new item. `content.id` is ignored.
    async fn create(&self, content: &Content) -> Result<Content>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Content>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Content>>;

    /// Whether a slug is taken, optionally ignoring one record
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Every item, newest first
    async fn list_all(&self) -> Result<Vec<Content>>;

    /// One filtered, sorted page of published items plus the total match count
    async fn list_public(&self, query: &PublicContentQuery) -> Result<(Vec<Content>, i64)>;

    async fn update(&self, content: &Content) -> Result<Content>;

    /// Delete an item and its category assignments. Returns false if missing.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Assign categories, skipping duplicates and unknown category ids
    async fn add_categories(&self, content_id: i64, category_ids: &[i64]) -> Result<()>;

    /// Replace the category set of an item
    async fn set_categories(&self, content_id: i64, category_ids: &[i64]) -> Result<()>;

    /// Categories of several items at once, as `(content_id, category)` pairs
    async fn categories_for(&self, content_ids: &[i64]) -> Result<Vec<(i64, Category)>>;

    /// Other published items sharing the type or any of the categories,
    /// most viewed first
    async fn suggested(
        &self,
        content: &Content,
        category_ids: &[i64],
        limit: i64,
    ) -> Result<Vec<Content>>;
}

/// SQLx-based content repository implementation
pub struct SqlxContentRepository {
    pool: DynDatabasePool,
}

impl SqlxContentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContentRepository for SqlxContentRepository {
    async fn create(&self, content: &Content) -> Result<Content> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), content).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), content).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Content>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Content>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                get_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                slug_exists_sqlite(self.pool.as_sqlite().unwrap(), slug, exclude_id).await
            }
            DatabaseDriver::Mysql => {
                slug_exists_mysql(self.pool.as_mysql().unwrap(), slug, exclude_id).await
            }
        }
    }

    async fn list_all(&self) -> Result<Vec<Content>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_all_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_all_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn list_public(&self, query: &PublicContentQuery) -> Result<(Vec<Content>, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_public_sqlite(self.pool.as_sqlite().unwrap(), query).await
            }
            DatabaseDriver::Mysql => list_public_mysql(self.pool.as_mysql().unwrap(), query).await,
        }
    }

    async fn update(&self, content: &Content) -> Result<Content> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), content).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), content).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn add_categories(&self, content_id: i64, category_ids: &[i64]) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                add_categories_sqlite(self.pool.as_sqlite().unwrap(), content_id, category_ids)
                    .await
            }
            DatabaseDriver::Mysql => {
                add_categories_mysql(self.pool.as_mysql().unwrap(), content_id, category_ids)
                    .await
            }
        }
    }

    async fn set_categories(&self, content_id: i64, category_ids: &[i64]) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_categories_sqlite(self.pool.as_sqlite().unwrap(), content_id, category_ids)
                    .await
            }
            DatabaseDriver::Mysql => {
                set_categories_mysql(self.pool.as_mysql().unwrap(), content_id, category_ids)
                    .await
            }
        }
    }

    async fn categories_for(&self, content_ids: &[i64]) -> Result<Vec<(i64, Category)>> {
        if content_ids.is_empty() {
            return Ok(Vec::new());
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                categories_for_sqlite(self.pool.as_sqlite().unwrap(), content_ids).await
            }
            DatabaseDriver::Mysql => {
                categories_for_mysql(self.pool.as_mysql().unwrap(), content_ids).await
            }
        }
    }

    async fn suggested(
        &self,
        content: &Content,
        category_ids: &[i64],
        limit: i64,
    ) -> Result<Vec<Content>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                suggested_sqlite(self.pool.as_sqlite().unwrap(), content, category_ids, limit)
                    .await
            }
            DatabaseDriver::Mysql => {
                suggested_mysql(self.pool.as_mysql().unwrap(), content, category_ids, limit).await
            }
        }
    }
}

// ============================================================================
// Shared SQL
// ============================================================================

const CONTENT_COLUMNS: &str = "c.id, c.title, c.slug, c.content_type, c.image_url, c.description, \
     c.external_url, c.status, c.direct_redirect, c.tags, c.rating, c.views_total, \
     c.clicks_total, c.created_at, c.updated_at";

const INSERT_CONTENT: &str = r#"
    INSERT INTO contents (title, slug, content_type, image_url, description, external_url,
        status, direct_redirect, tags, rating, views_total, clicks_total, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?, ?)
"#;

const UPDATE_CONTENT: &str = r#"
    UPDATE contents
    SET title = ?, slug = ?, content_type = ?, image_url = ?, description = ?, external_url = ?,
        status = ?, direct_redirect = ?, tags = ?, rating = ?, updated_at = ?
    WHERE id = ?
"#;

const PUBLIC_FILTER: &str = r#"
    FROM contents c
    WHERE c.status = ? AND c.content_type = ?
      AND (? IS NULL OR EXISTS (
            SELECT 1 FROM content_categories cc
            JOIN categories cat ON cat.id = cc.category_id
            WHERE cc.content_id = c.id AND cat.slug = ?))
      AND (? IS NULL OR LOWER(c.title) LIKE ?)
"#;

const CATEGORY_COLUMNS: &str =
    "cat.id, cat.name, cat.slug, cat.type_scope, cat.sort_order, cat.created_at, cat.updated_at";

fn select_one(filter: &str) -> String {
    format!("SELECT {} FROM contents c WHERE {}", CONTENT_COLUMNS, filter)
}

fn order_clause(sort: ContentSort) -> &'static str {
    match sort {
        ContentSort::Az => "c.title ASC, c.id ASC",
        ContentSort::New => "c.created_at DESC, c.id DESC",
        ContentSort::Views => "c.views_total DESC, c.id DESC",
    }
}

fn search_pattern(query: &PublicContentQuery) -> Option<String> {
    query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.to_lowercase()))
}

fn category_filter(query: &PublicContentQuery) -> Option<String> {
    query
        .category_slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn public_list_sql(query: &PublicContentQuery) -> String {
    format!(
        "SELECT {} {} ORDER BY {} LIMIT ? OFFSET ?",
        CONTENT_COLUMNS,
        PUBLIC_FILTER,
        order_clause(query.sort)
    )
}

fn public_count_sql() -> String {
    format!("SELECT COUNT(*) {}", PUBLIC_FILTER)
}

fn suggested_sql(category_count: usize) -> String {
    let category_match = if category_count > 0 {
        format!(
            " OR EXISTS (SELECT 1 FROM content_categories cc WHERE cc.content_id = c.id AND cc.category_id IN ({}))",
            placeholders(category_count)
        )
    } else {
        String::new()
    };
    format!(
        "SELECT {} FROM contents c WHERE c.id <> ? AND c.status = ? AND (c.content_type = ?{}) \
         ORDER BY c.views_total DESC, c.id ASC LIMIT ?",
        CONTENT_COLUMNS, category_match
    )
}

fn categories_for_sql(count: usize) -> String {
    format!(
        "SELECT cc.content_id, {} FROM content_categories cc \
         JOIN categories cat ON cat.id = cc.category_id \
         WHERE cc.content_id IN ({}) ORDER BY cat.sort_order ASC, cat.name ASC",
        CATEGORY_COLUMNS,
        placeholders(count)
    )
}

macro_rules! content_from_row {
    ($row:expr) => {{
        let row = $row;
        Ok(Content {
            id: row.get("id"),
            title: row.get("title"),
            slug: row.get("slug"),
            content_type: parse_enum(row.get::<String, _>("content_type").as_str())?,
            image_url: row.get("image_url"),
            description: row.get("description"),
            external_url: row.get("external_url"),
            status: parse_enum(row.get::<String, _>("status").as_str())?,
            direct_redirect: row.get("direct_redirect"),
            tags: row.get("tags"),
            rating: row.get("rating"),
            views_total: row.get("views_total"),
            clicks_total: row.get("clicks_total"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }};
}

/// Columns for a [`ContentSummary`] joined through alias `c`
pub(crate) const CONTENT_SUMMARY_COLUMNS: &str = "c.id AS summary_id, c.title AS summary_title, \
     c.slug AS summary_slug, c.content_type AS summary_type, c.image_url AS summary_image_url";

macro_rules! content_summary_from_row {
    ($row:expr) => {{
        let row = $row;
        Ok::<_, anyhow::Error>(crate::models::ContentSummary {
            id: row.get("summary_id"),
            title: row.get("summary_title"),
            slug: row.get("summary_slug"),
            content_type: crate::db::repositories::parse_enum(
                row.get::<String, _>("summary_type").as_str(),
            )?,
            image_url: row.get("summary_image_url"),
        })
    }};
}

pub(crate) use content_summary_from_row;

fn row_to_content_sqlite(row: &SqliteRow) -> Result<Content> {
    content_from_row!(row)
}

fn row_to_content_mysql(row: &MySqlRow) -> Result<Content> {
    content_from_row!(row)
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, content: &Content) -> Result<Content> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_CONTENT)
        .bind(&content.title)
        .bind(&content.slug)
        .bind(content.content_type.as_str())
        .bind(&content.image_url)
        .bind(&content.description)
        .bind(&content.external_url)
        .bind(content.status.as_str())
        .bind(content.direct_redirect)
        .bind(&content.tags)
        .bind(content.rating)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create content")?;

    Ok(Content {
        id: result.last_insert_rowid(),
        views_total: 0,
        clicks_total: 0,
        created_at: now,
        updated_at: now,
        ..content.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Content>> {
    let row = sqlx::query(&select_one("c.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get content by ID")?;

    row.as_ref().map(row_to_content_sqlite).transpose()
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Content>> {
    let row = sqlx::query(&select_one("c.slug = ?"))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get content by slug")?;

    row.as_ref().map(row_to_content_sqlite).transpose()
}

async fn slug_exists_sqlite(pool: &SqlitePool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM contents WHERE slug = ? AND (? IS NULL OR id <> ?)")
            .bind(slug)
            .bind(exclude_id)
            .bind(exclude_id)
            .fetch_one(pool)
            .await
            .context("Failed to check content slug")?;
    Ok(count > 0)
}

async fn list_all_sqlite(pool: &SqlitePool) -> Result<Vec<Content>> {
    let sql = format!(
        "SELECT {} FROM contents c ORDER BY c.created_at DESC, c.id DESC",
        CONTENT_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list content")?;

    rows.iter().map(row_to_content_sqlite).collect()
}

async fn list_public_sqlite(
    pool: &SqlitePool,
    query: &PublicContentQuery,
) -> Result<(Vec<Content>, i64)> {
    let category = category_filter(query);
    let pattern = search_pattern(query);

    let total: i64 = sqlx::query_scalar(&public_count_sql())
        .bind(ContentStatus::Published.as_str())
        .bind(query.content_type.as_str())
        .bind(&category)
        .bind(&category)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(pool)
        .await
        .context("Failed to count public content")?;

    let rows = sqlx::query(&public_list_sql(query))
        .bind(ContentStatus::Published.as_str())
        .bind(query.content_type.as_str())
        .bind(&category)
        .bind(&category)
        .bind(&pattern)
        .bind(&pattern)
        .bind(query.page_size)
        .bind(query.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list public content")?;

    let items = rows.iter().map(row_to_content_sqlite).collect::<Result<Vec<_>>>()?;
    Ok((items, total))
}

async fn update_sqlite(pool: &SqlitePool, content: &Content) -> Result<Content> {
    let now = Utc::now();

    sqlx::query(UPDATE_CONTENT)
        .bind(&content.title)
        .bind(&content.slug)
        .bind(content.content_type.as_str())
        .bind(&content.image_url)
        .bind(&content.description)
        .bind(&content.external_url)
        .bind(content.status.as_str())
        .bind(content.direct_redirect)
        .bind(&content.tags)
        .bind(content.rating)
        .bind(now)
        .bind(content.id)
        .execute(pool)
        .await
        .context("Failed to update content")?;

    Ok(Content {
        updated_at: now,
        ..content.clone()
    })
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM content_categories WHERE content_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete content categories")?;

    let result = sqlx::query("DELETE FROM contents WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete content")?;

    tx.commit().await.context("Failed to commit content delete")?;
    Ok(result.rows_affected() > 0)
}

async fn add_categories_sqlite(pool: &SqlitePool, content_id: i64, category_ids: &[i64]) -> Result<()> {
    for category_id in category_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO content_categories (content_id, category_id) \
             SELECT ?, id FROM categories WHERE id = ?",
        )
        .bind(content_id)
        .bind(category_id)
        .execute(pool)
        .await
        .context("Failed to assign category")?;
    }
    Ok(())
}

async fn set_categories_sqlite(pool: &SqlitePool, content_id: i64, category_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM content_categories WHERE content_id = ?")
        .bind(content_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear content categories")?;

    for category_id in category_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO content_categories (content_id, category_id) \
             SELECT ?, id FROM categories WHERE id = ?",
        )
        .bind(content_id)
        .bind(category_id)
        .execute(&mut *tx)
        .await
        .context("Failed to assign category")?;
    }

    tx.commit().await.context("Failed to commit category assignment")?;
    Ok(())
}

async fn categories_for_sqlite(pool: &SqlitePool, content_ids: &[i64]) -> Result<Vec<(i64, Category)>> {
    let sql = categories_for_sql(content_ids.len());
    let mut query = sqlx::query(&sql);
    for id in content_ids {
        query = query.bind(id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load content categories")?;

    rows.iter()
        .map(|row| -> Result<(i64, Category)> {
            Ok((row.get("content_id"), category_from_row!(row)?))
        })
        .collect()
}

async fn suggested_sqlite(
    pool: &SqlitePool,
    content: &Content,
    category_ids: &[i64],
    limit: i64,
) -> Result<Vec<Content>> {
    let sql = suggested_sql(category_ids.len());
    let mut query = sqlx::query(&sql)
        .bind(content.id)
        .bind(ContentStatus::Published.as_str())
        .bind(content.content_type.as_str());
    for id in category_ids {
        query = query.bind(id);
    }
    let rows = query
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to load suggested content")?;

    rows.iter().map(row_to_content_sqlite).collect()
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, content: &Content) -> Result<Content> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_CONTENT)
        .bind(&content.title)
        .bind(&content.slug)
        .bind(content.content_type.as_str())
        .bind(&content.image_url)
        .bind(&content.description)
        .bind(&content.external_url)
        .bind(content.status.as_str())
        .bind(content.direct_redirect)
        .bind(&content.tags)
        .bind(content.rating)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create content")?;

    Ok(Content {
        id: result.last_insert_id() as i64,
        views_total: 0,
        clicks_total: 0,
        created_at: now,
        updated_at: now,
        ..content.clone()
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Content>> {
    let row = sqlx::query(&select_one("c.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get content by ID")?;

    row.as_ref().map(row_to_content_mysql).transpose()
}

async fn get_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Content>> {
    let row = sqlx::query(&select_one("c.slug = ?"))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get content by slug")?;

    row.as_ref().map(row_to_content_mysql).transpose()
}

async fn slug_exists_mysql(pool: &MySqlPool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM contents WHERE slug = ? AND (? IS NULL OR id <> ?)")
            .bind(slug)
            .bind(exclude_id)
            .bind(exclude_id)
            .fetch_one(pool)
            .await
            .context("Failed to check content slug")?;
    Ok(count > 0)
}

async fn list_all_mysql(pool: &MySqlPool) -> Result<Vec<Content>> {
    let sql = format!(
        "SELECT {} FROM contents c ORDER BY c.created_at DESC, c.id DESC",
        CONTENT_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list content")?;

    rows.iter().map(row_to_content_mysql).collect()
}

async fn list_public_mysql(
    pool: &MySqlPool,
    query: &PublicContentQuery,
) -> Result<(Vec<Content>, i64)> {
    let category = category_filter(query);
    let pattern = search_pattern(query);

    let total: i64 = sqlx::query_scalar(&public_count_sql())
        .bind(ContentStatus::Published.as_str())
        .bind(query.content_type.as_str())
        .bind(&category)
        .bind(&category)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(pool)
        .await
        .context("Failed to count public content")?;

    let rows = sqlx::query(&public_list_sql(query))
        .bind(ContentStatus::Published.as_str())
        .bind(query.content_type.as_str())
        .bind(&category)
        .bind(&category)
        .bind(&pattern)
        .bind(&pattern)
        .bind(query.page_size)
        .bind(query.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list public content")?;

    let items = rows.iter().map(row_to_content_mysql).collect::<Result<Vec<_>>>()?;
    Ok((items, total))
}

async fn update_mysql(pool: &MySqlPool, content: &Content) -> Result<Content> {
    let now = Utc::now();

    sqlx::query(UPDATE_CONTENT)
        .bind(&content.title)
        .bind(&content.slug)
        .bind(content.content_type.as_str())
        .bind(&content.image_url)
        .bind(&content.description)
        .bind(&content.external_url)
        .bind(content.status.as_str())
        .bind(content.direct_redirect)
        .bind(&content.tags)
        .bind(content.rating)
        .bind(now)
        .bind(content.id)
        .execute(pool)
        .await
        .context("Failed to update content")?;

    Ok(Content {
        updated_at: now,
        ..content.clone()
    })
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM content_categories WHERE content_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete content categories")?;

    let result = sqlx::query("DELETE FROM contents WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to delete content")?;

    tx.commit().await.context("Failed to commit content delete")?;
    Ok(result.rows_affected() > 0)
}

async fn add_categories_mysql(pool: &MySqlPool, content_id: i64, category_ids: &[i64]) -> Result<()> {
    for category_id in category_ids {
        sqlx::query(
            "INSERT IGNORE INTO content_categories (content_id, category_id) \
             SELECT ?, id FROM categories WHERE id = ?",
        )
        .bind(content_id)
        .bind(category_id)
        .execute(pool)
        .await
        .context("Failed to assign category")?;
    }
    Ok(())
}

async fn set_categories_mysql(pool: &MySqlPool, content_id: i64, category_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM content_categories WHERE content_id = ?")
        .bind(content_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear content categories")?;

    for category_id in category_ids {
        sqlx::query(
            "INSERT IGNORE INTO content_categories (content_id, category_id) \
             SELECT ?, id FROM categories WHERE id = ?",
        )
        .bind(content_id)
        .bind(category_id)
        .execute(&mut *tx)
        .await
        .context("Failed to assign category")?;
    }

    tx.commit().await.context("Failed to commit category assignment")?;
    Ok(())
}

async fn categories_for_mysql(pool: &MySqlPool, content_ids: &[i64]) -> Result<Vec<(i64, Category)>> {
    let sql = categories_for_sql(content_ids.len());
    let mut query = sqlx::query(&sql);
    for id in content_ids {
        query = query.bind(id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load content categories")?;

    rows.iter()
        .map(|row| -> Result<(i64, Category)> {
            Ok((row.get("content_id"), category_from_row!(row)?))
        })
        .collect()
}

async fn suggested_mysql(
    pool: &MySqlPool,
    content: &Content,
    category_ids: &[i64],
    limit: i64,
) -> Result<Vec<Content>> {
    let sql = suggested_sql(category_ids.len());
    let mut query = sqlx::query(&sql)
        .bind(content.id)
        .bind(ContentStatus::Published.as_str())
        .bind(content.content_type.as_str());
    for id in category_ids {
        query = query.bind(id);
    }
    let rows = query
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to load suggested content")?;

    rows.iter().map(row_to_content_mysql).collect()
}
