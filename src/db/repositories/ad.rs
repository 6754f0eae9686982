//! Ad repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{mysql::MySqlRow, sqlite::SqliteRow, MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::parse_enum;
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::Ad;

/// Ad repository trait
#[async_trait]
pub trait AdRepository: Send + Sync {
    async fn create(&self, ad: &Ad) -> Result<Ad>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Ad>>;

    /// All ads ordered by position, sort order, id
    async fn list(&self) -> Result<Vec<Ad>>;

    /// Ads for a position that are live at `now`
    async fn list_active(&self, position: &str, now: DateTime<Utc>) -> Result<Vec<Ad>>;

    async fn update(&self, ad: &Ad) -> Result<Ad>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based ad repository implementation
pub struct SqlxAdRepository {
    pool: DynDatabasePool,
}

impl SqlxAdRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AdRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AdRepository for SqlxAdRepository {
    async fn create(&self, ad: &Ad) -> Result<Ad> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), ad).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), ad).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Ad>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(&self) -> Result<Vec<Ad>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), None).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), None).await,
        }
    }

    async fn list_active(&self, position: &str, now: DateTime<Utc>) -> Result<Vec<Ad>> {
        // The schedule window is compared in Rust so both backends agree on
        // timestamp semantics.
        let ads = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_sqlite(self.pool.as_sqlite().unwrap(), Some(position)).await?
            }
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), Some(position)).await?,
        };
        Ok(ads.into_iter().filter(|ad| ad.is_live_at(now)).collect())
    }

    async fn update(&self, ad: &Ad) -> Result<Ad> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), ad).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), ad).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const SELECT_AD: &str = "SELECT id, position, ad_type, image_url, script_code, target_url, is_active, \
     start_date, end_date, sort_order, created_at, updated_at FROM ads";

const INSERT_AD: &str = r#"
    INSERT INTO ads (position, ad_type, image_url, script_code, target_url, is_active,
        start_date, end_date, sort_order, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_AD: &str = r#"
    UPDATE ads
    SET position = ?, ad_type = ?, image_url = ?, script_code = ?, target_url = ?, is_active = ?,
        start_date = ?, end_date = ?, sort_order = ?, updated_at = ?
    WHERE id = ?
"#;

fn list_sql(by_position: bool) -> String {
    if by_position {
        format!(
            "{} WHERE position = ? AND is_active = ? ORDER BY sort_order ASC, id ASC",
            SELECT_AD
        )
    } else {
        format!("{} ORDER BY position ASC, sort_order ASC, id ASC", SELECT_AD)
    }
}

macro_rules! ad_from_row {
    ($row:expr) => {{
        let row = $row;
        Ok(Ad {
            id: row.get("id"),
            position: row.get("position"),
            ad_type: parse_enum(row.get::<String, _>("ad_type").as_str())?,
            image_url: row.get("image_url"),
            script_code: row.get("script_code"),
            target_url: row.get("target_url"),
            is_active: row.get("is_active"),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
            sort_order: row.get("sort_order"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }};
}

fn row_to_ad_sqlite(row: &SqliteRow) -> Result<Ad> {
    ad_from_row!(row)
}

fn row_to_ad_mysql(row: &MySqlRow) -> Result<Ad> {
    ad_from_row!(row)
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, ad: &Ad) -> Result<Ad> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_AD)
        .bind(&ad.position)
        .bind(ad.ad_type.as_str())
        .bind(&ad.image_url)
        .bind(&ad.script_code)
        .bind(&ad.target_url)
        .bind(ad.is_active)
        .bind(ad.start_date)
        .bind(ad.end_date)
        .bind(ad.sort_order)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create ad")?;

    Ok(Ad {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..ad.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Ad>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_AD))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get ad by ID")?;

    row.as_ref().map(row_to_ad_sqlite).transpose()
}

async fn list_sqlite(pool: &SqlitePool, position: Option<&str>) -> Result<Vec<Ad>> {
    let sql = list_sql(position.is_some());
    let mut query = sqlx::query(&sql);
    if let Some(position) = position {
        query = query.bind(position).bind(true);
    }
    let rows = query.fetch_all(pool).await.context("Failed to list ads")?;

    rows.iter().map(row_to_ad_sqlite).collect()
}

async fn update_sqlite(pool: &SqlitePool, ad: &Ad) -> Result<Ad> {
    let now = Utc::now();

    sqlx::query(UPDATE_AD)
        .bind(&ad.position)
        .bind(ad.ad_type.as_str())
        .bind(&ad.image_url)
        .bind(&ad.script_code)
        .bind(&ad.target_url)
        .bind(ad.is_active)
        .bind(ad.start_date)
        .bind(ad.end_date)
        .bind(ad.sort_order)
        .bind(now)
        .bind(ad.id)
        .execute(pool)
        .await
        .context("Failed to update ad")?;

    Ok(Ad {
        updated_at: now,
        ..ad.clone()
    })
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM ads WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete ad")?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, ad: &Ad) -> Result<Ad> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_AD)
        .bind(&ad.position)
        .bind(ad.ad_type.as_str())
        .bind(&ad.image_url)
        .bind(&ad.script_code)
        .bind(&ad.target_url)
        .bind(ad.is_active)
        .bind(ad.start_date)
        .bind(ad.end_date)
        .bind(ad.sort_order)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create ad")?;

    Ok(Ad {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..ad.clone()
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Ad>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_AD))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get ad by ID")?;

    row.as_ref().map(row_to_ad_mysql).transpose()
}

async fn list_mysql(pool: &MySqlPool, position: Option<&str>) -> Result<Vec<Ad>> {
    let sql = list_sql(position.is_some());
    let mut query = sqlx::query(&sql);
    if let Some(position) = position {
        query = query.bind(position).bind(true);
    }
    let rows = query.fetch_all(pool).await.context("Failed to list ads")?;

    rows.iter().map(row_to_ad_mysql).collect()
}

async fn update_mysql(pool: &MySqlPool, ad: &Ad) -> Result<Ad> {
    let now = Utc::now();

    sqlx::query(UPDATE_AD)
        .bind(&ad.position)
        .bind(ad.ad_type.as_str())
        .bind(&ad.image_url)
        .bind(&ad.script_code)
        .bind(&ad.target_url)
        .bind(ad.is_active)
        .bind(ad.start_date)
        .bind(ad.end_date)
        .bind(ad.sort_order)
        .bind(now)
        .bind(ad.id)
        .execute(pool)
        .await
        .context("Failed to update ad")?;

    Ok(Ad {
        updated_at: now,
        ..ad.clone()
    })
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM ads WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete ad")?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;
    use crate::models::AdType;
    use chrono::Duration;

    fn ad(position: &str, sort_order: i32) -> Ad {
        let now = Utc::now();
        Ad {
            id: 0,
            position: position.to_string(),
            ad_type: AdType::Image,
            image_url: Some("banner.png".to_string()),
            script_code: None,
            target_url: Some("https://sponsor.example".to_string()),
            is_active: true,
            start_date: None,
            end_date: None,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_order() {
        let repo = SqlxAdRepository::new(migrated_pool().await);
        let b = repo.create(&ad("sidebar", 0)).await.unwrap();
        let a2 = repo.create(&ad("header", 2)).await.unwrap();
        let a1 = repo.create(&ad("header", 1)).await.unwrap();

        let ids: Vec<i64> = repo.list().await.unwrap().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![a1.id, a2.id, b.id]);
    }

    #[tokio::test]
    async fn test_list_active_respects_window_and_flag() {
        let repo = SqlxAdRepository::new(migrated_pool().await);
        let now = Utc::now();
        let day = Duration::days(1);

        let open = repo.create(&ad("redirect_page", 0)).await.unwrap();

        let mut future = ad("redirect_page", 1);
        future.start_date = Some(now + day);
        repo.create(&future).await.unwrap();

        let mut expired = ad("redirect_page", 2);
        expired.end_date = Some(now - day);
        repo.create(&expired).await.unwrap();

        let mut inactive = ad("redirect_page", 3);
        inactive.is_active = false;
        repo.create(&inactive).await.unwrap();

        let mut windowed = ad("redirect_page", 4);
        windowed.start_date = Some(now - day);
        windowed.end_date = Some(now + day);
        let windowed = repo.create(&windowed).await.unwrap();

        repo.create(&ad("header", 0)).await.unwrap();

        let live: Vec<i64> = repo
            .list_active("redirect_page", now)
            .await
            .unwrap()
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(live, vec![open.id, windowed.id]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = SqlxAdRepository::new(migrated_pool().await);
        let created = repo.create(&ad("footer", 0)).await.unwrap();

        let mut changed = created.clone();
        changed.ad_type = AdType::Script;
        changed.image_url = None;
        changed.script_code = Some("<script></script>".to_string());
        repo.update(&changed).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.ad_type, AdType::Script);
        assert!(fetched.image_url.is_none());

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
