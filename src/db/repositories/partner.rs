//! Partner repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{mysql::MySqlRow, sqlite::SqliteRow, MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Partner, PartnerWithLinkCount};

/// Partner repository trait
#[async_trait]
pub trait PartnerRepository: Send + Sync {
    async fn create(&self, partner: &Partner) -> Result<Partner>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Partner>>;

    /// Whether a slug is taken, optionally ignoring one record
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// All partners with their link counts, highest priority first
    async fn list_with_link_counts(&self) -> Result<Vec<PartnerWithLinkCount>>;

    async fn update(&self, partner: &Partner) -> Result<Partner>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based partner repository implementation
pub struct SqlxPartnerRepository {
    pool: DynDatabasePool,
}

impl SqlxPartnerRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PartnerRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PartnerRepository for SqlxPartnerRepository {
    async fn create(&self, partner: &Partner) -> Result<Partner> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), partner).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), partner).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Partner>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
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

    async fn list_with_link_counts(&self) -> Result<Vec<PartnerWithLinkCount>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn update(&self, partner: &Partner) -> Result<Partner> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), partner).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), partner).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const PARTNER_COLUMNS: &str = "p.id, p.name, p.slug, p.website_url, p.logo_url, p.is_verified, \
     p.priority_score, p.description, p.created_at, p.updated_at";

const INSERT_PARTNER: &str = r#"
    INSERT INTO partners (name, slug, website_url, logo_url, is_verified, priority_score,
        description, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_PARTNER: &str = r#"
    UPDATE partners
    SET name = ?, slug = ?, website_url = ?, logo_url = ?, is_verified = ?, priority_score = ?,
        description = ?, updated_at = ?
    WHERE id = ?
"#;

fn list_sql() -> String {
    format!(
        "SELECT {}, (SELECT COUNT(*) FROM content_links l WHERE l.partner_id = p.id) AS links_count \
         FROM partners p ORDER BY p.priority_score DESC, p.name ASC",
        PARTNER_COLUMNS
    )
}

macro_rules! partner_from_row {
    ($row:expr) => {{
        let row = $row;
        Partner {
            id: row.get("id"),
            name: row.get("name"),
            slug: row.get("slug"),
            website_url: row.get("website_url"),
            logo_url: row.get("logo_url"),
            is_verified: row.get("is_verified"),
            priority_score: row.get("priority_score"),
            description: row.get("description"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }};
}

fn row_to_partner_sqlite(row: &SqliteRow) -> Partner {
    partner_from_row!(row)
}

fn row_to_partner_mysql(row: &MySqlRow) -> Partner {
    partner_from_row!(row)
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, partner: &Partner) -> Result<Partner> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_PARTNER)
        .bind(&partner.name)
        .bind(&partner.slug)
        .bind(&partner.website_url)
        .bind(&partner.logo_url)
        .bind(partner.is_verified)
        .bind(partner.priority_score)
        .bind(&partner.description)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create partner")?;

    Ok(Partner {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..partner.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Partner>> {
    let sql = format!("SELECT {} FROM partners p WHERE p.id = ?", PARTNER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get partner by ID")?;

    Ok(row.as_ref().map(row_to_partner_sqlite))
}

async fn slug_exists_sqlite(pool: &SqlitePool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM partners WHERE slug = ? AND (? IS NULL OR id <> ?)")
            .bind(slug)
            .bind(exclude_id)
            .bind(exclude_id)
            .fetch_one(pool)
            .await
            .context("Failed to check partner slug")?;
    Ok(count > 0)
}

async fn list_sqlite(pool: &SqlitePool) -> Result<Vec<PartnerWithLinkCount>> {
    let rows = sqlx::query(&list_sql())
        .fetch_all(pool)
        .await
        .context("Failed to list partners")?;

    Ok(rows
        .iter()
        .map(|row| PartnerWithLinkCount {
            partner: row_to_partner_sqlite(row),
            links_count: row.get("links_count"),
        })
        .collect())
}

async fn update_sqlite(pool: &SqlitePool, partner: &Partner) -> Result<Partner> {
    let now = Utc::now();

    sqlx::query(UPDATE_PARTNER)
        .bind(&partner.name)
        .bind(&partner.slug)
        .bind(&partner.website_url)
        .bind(&partner.logo_url)
        .bind(partner.is_verified)
        .bind(partner.priority_score)
        .bind(&partner.description)
        .bind(now)
        .bind(partner.id)
        .execute(pool)
        .await
        .context("Failed to update partner")?;

    Ok(Partner {
        updated_at: now,
        ..partner.clone()
    })
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM partners WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete partner")?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, partner: &Partner) -> Result<Partner> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_PARTNER)
        .bind(&partner.name)
        .bind(&partner.slug)
        .bind(&partner.website_url)
        .bind(&partner.logo_url)
        .bind(partner.is_verified)
        .bind(partner.priority_score)
        .bind(&partner.description)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create partner")?;

    Ok(Partner {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..partner.clone()
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Partner>> {
    let sql = format!("SELECT {} FROM partners p WHERE p.id = ?", PARTNER_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get partner by ID")?;

    Ok(row.as_ref().map(row_to_partner_mysql))
}

async fn slug_exists_mysql(pool: &MySqlPool, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM partners WHERE slug = ? AND (? IS NULL OR id <> ?)")
            .bind(slug)
            .bind(exclude_id)
            .bind(exclude_id)
            .fetch_one(pool)
            .await
            .context("Failed to check partner slug")?;
    Ok(count > 0)
}

async fn list_mysql(pool: &MySqlPool) -> Result<Vec<PartnerWithLinkCount>> {
    let rows = sqlx::query(&list_sql())
        .fetch_all(pool)
        .await
        .context("Failed to list partners")?;

    Ok(rows
        .iter()
        .map(|row| PartnerWithLinkCount {
            partner: row_to_partner_mysql(row),
            links_count: row.get("links_count"),
        })
        .collect())
}

async fn update_mysql(pool: &MySqlPool, partner: &Partner) -> Result<Partner> {
    let now = Utc::now();

    sqlx::query(UPDATE_PARTNER)
        .bind(&partner.name)
        .bind(&partner.slug)
        .bind(&partner.website_url)
        .bind(&partner.logo_url)
        .bind(partner.is_verified)
        .bind(partner.priority_score)
        .bind(&partner.description)
        .bind(now)
        .bind(partner.id)
        .execute(pool)
        .await
        .context("Failed to update partner")?;

    Ok(Partner {
        updated_at: now,
        ..partner.clone()
    })
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM partners WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete partner")?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_content, migrated_pool};

    fn partner(name: &str, slug: &str, priority_score: i32) -> Partner {
        let now = Utc::now();
        Partner {
            id: 0,
            name: name.to_string(),
            slug: slug.to_string(),
            website_url: format!("https://{}.example", slug),
            logo_url: None,
            is_verified: false,
            priority_score,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_orders_by_priority_and_counts_links() {
        let pool = migrated_pool().await;
        let repo = SqlxPartnerRepository::new(pool.clone());

        let low = repo.create(&partner("Zeta", "zeta", 1)).await.unwrap();
        let high = repo.create(&partner("Alpha", "alpha", 10)).await.unwrap();
        let tie = repo.create(&partner("Beta", "beta", 10)).await.unwrap();

        let content = insert_content(&pool, "dororo").await;
        for _ in 0..2 {
            sqlx::query(
                "INSERT INTO content_links (content_id, url, source_name, link_type, partner_id) \
                 VALUES (?, 'https://x', 'x', 'READ', ?)",
            )
            .bind(content.id)
            .bind(high.id)
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        }

        let listed = repo.list_with_link_counts().await.unwrap();
        let ids: Vec<i64> = listed.iter().map(|p| p.partner.id).collect();
        assert_eq!(ids, vec![high.id, tie.id, low.id]);
        assert_eq!(listed[0].links_count, 2);
        assert_eq!(listed[2].links_count, 0);
    }

    #[tokio::test]
    async fn test_update_delete_and_slug_exists() {
        let pool = migrated_pool().await;
        let repo = SqlxPartnerRepository::new(pool);

        let created = repo.create(&partner("Mango", "mango", 0)).await.unwrap();
        assert!(repo.slug_exists("mango", None).await.unwrap());
        assert!(!repo.slug_exists("mango", Some(created.id)).await.unwrap());

        let mut changed = created.clone();
        changed.is_verified = true;
        changed.logo_url = Some("logo.png".to_string());
        repo.update(&changed).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert!(fetched.is_verified);
        assert_eq!(fetched.logo_url.as_deref(), Some("logo.png"));

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
