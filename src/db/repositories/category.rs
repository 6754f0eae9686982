//! Category repository
//!
//! Provides database operations for categories.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{mysql::MySqlRow, sqlite::SqliteRow, MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Category, ContentType, TypeScope};

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, category: &Category) -> Result<Category>;

    /// Get category by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// Get category by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// Whether a slug is taken, optionally ignoring one record
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// List all categories by sort order
    async fn list_all(&self) -> Result<Vec<Category>>;

    /// Categories scoped to a content type, universal ones included
    async fn list_for_type(&self, content_type: ContentType) -> Result<Vec<Category>>;

    /// Update a category
    async fn update(&self, category: &Category) -> Result<Category>;

    /// Delete a category. Returns false if it did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based category repository implementation
pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    /// Create a new SQLx category repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, category: &Category) -> Result<Category> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), category).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), category).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => get_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await,
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

    async fn list_all(&self) -> Result<Vec<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), None).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), None).await,
        }
    }

    async fn list_for_type(&self, content_type: ContentType) -> Result<Vec<Category>> {
        let scope = TypeScope::from(content_type);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_sqlite(self.pool.as_sqlite().unwrap(), Some(scope)).await
            }
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), Some(scope)).await,
        }
    }

    async fn update(&self, category: &Category) -> Result<Category> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), category).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), category).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

/// Map a row selected with the `cat` alias (or bare columns) to a [`Category`]
macro_rules! category_from_row {
    ($row:expr) => {{
        let row = $row;
        Ok::<_, anyhow::Error>(crate::models::Category {
            id: row.get("id"),
            name: row.get("name"),
            slug: row.get("slug"),
            type_scope: crate::db::repositories::parse_enum(
                row.get::<String, _>("type_scope").as_str(),
            )?,
            sort_order: row.get("sort_order"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }};
}

pub(crate) use category_from_row;

const SELECT_CATEGORY: &str =
    "SELECT id, name, slug, type_scope, sort_order, created_at, updated_at FROM categories";

fn list_sql(scoped: bool) -> String {
    if scoped {
        format!(
            "{} WHERE type_scope = ? OR type_scope = ? ORDER BY sort_order ASC, name ASC",
            SELECT_CATEGORY
        )
    } else {
        format!("{} ORDER BY sort_order ASC, name ASC", SELECT_CATEGORY)
    }
}

fn row_to_category_sqlite(row: &SqliteRow) -> Result<Category> {
    category_from_row!(row)
}

fn row_to_category_mysql(row: &MySqlRow) -> Result<Category> {
    category_from_row!(row)
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, category: &Category) -> Result<Category> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO categories (name, slug, type_scope, sort_order, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&category.name)
    .bind(&category.slug)
    .bind(category.type_scope.as_str())
    .bind(category.sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    Ok(Category {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..category.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Category>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_CATEGORY))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by ID")?;

    row.as_ref().map(row_to_category_sqlite).transpose()
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Category>> {
    let row = sqlx::query(&format!("{} WHERE slug = ?", SELECT_CATEGORY))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by slug")?;

    row.as_ref().map(row_to_category_sqlite).transpose()
}

async fn slug_exists_sqlite(pool: &SqlitePool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE slug = ? AND (? IS NULL OR id <> ?)")
            .bind(slug)
            .bind(exclude_id)
            .bind(exclude_id)
            .fetch_one(pool)
            .await
            .context("Failed to check category slug")?;
    Ok(count > 0)
}

async fn list_sqlite(pool: &SqlitePool, scope: Option<TypeScope>) -> Result<Vec<Category>> {
    let sql = list_sql(scope.is_some());
    let mut query = sqlx::query(&sql);
    if let Some(scope) = scope {
        query = query.bind(scope.as_str()).bind(TypeScope::Universal.as_str());
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list categories")?;

    rows.iter().map(row_to_category_sqlite).collect()
}

async fn update_sqlite(pool: &SqlitePool, category: &Category) -> Result<Category> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE categories SET name = ?, slug = ?, type_scope = ?, sort_order = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&category.name)
    .bind(&category.slug)
    .bind(category.type_scope.as_str())
    .bind(category.sort_order)
    .bind(now)
    .bind(category.id)
    .execute(pool)
    .await
    .context("Failed to update category")?;

    Ok(Category {
        updated_at: now,
        ..category.clone()
    })
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete category")?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, category: &Category) -> Result<Category> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO categories (name, slug, type_scope, sort_order, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&category.name)
    .bind(&category.slug)
    .bind(category.type_scope.as_str())
    .bind(category.sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    Ok(Category {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..category.clone()
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Category>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_CATEGORY))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by ID")?;

    row.as_ref().map(row_to_category_mysql).transpose()
}

async fn get_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Category>> {
    let row = sqlx::query(&format!("{} WHERE slug = ?", SELECT_CATEGORY))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by slug")?;

    row.as_ref().map(row_to_category_mysql).transpose()
}

async fn slug_exists_mysql(pool: &MySqlPool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE slug = ? AND (? IS NULL OR id <> ?)")
            .bind(slug)
            .bind(exclude_id)
            .bind(exclude_id)
            .fetch_one(pool)
            .await
            .context("Failed to check category slug")?;
    Ok(count > 0)
}

async fn list_mysql(pool: &MySqlPool, scope: Option<TypeScope>) -> Result<Vec<Category>> {
    let sql = list_sql(scope.is_some());
    let mut query = sqlx::query(&sql);
    if let Some(scope) = scope {
        query = query.bind(scope.as_str()).bind(TypeScope::Universal.as_str());
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list categories")?;

    rows.iter().map(row_to_category_mysql).collect()
}

async fn update_mysql(pool: &MySqlPool, category: &Category) -> Result<Category> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE categories SET name = ?, slug = ?, type_scope = ?, sort_order = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&category.name)
    .bind(&category.slug)
    .bind(category.type_scope.as_str())
    .bind(category.sort_order)
    .bind(now)
    .bind(category.id)
    .execute(pool)
    .await
    .context("Failed to update category")?;

    Ok(Category {
        updated_at: now,
        ..category.clone()
    })
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete category")?;

    Ok(result.rows_affected() > 0)
}
