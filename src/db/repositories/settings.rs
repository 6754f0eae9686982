//! Site settings repository
//!
//! The settings table holds a single row. `get` returns the first one and
//! `create_default` inserts it when the table is empty.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{mysql::MySqlRow, sqlite::SqliteRow, MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{SiteSettings, DEFAULT_SITE_NAME};

/// Settings repository trait
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// The settings row, if it has been created
    async fn get(&self) -> Result<Option<SiteSettings>>;

    /// Insert the row with default values
    async fn create_default(&self) -> Result<SiteSettings>;

    /// Overwrite every column of the row
    async fn update(&self, settings: &SiteSettings) -> Result<SiteSettings>;
}

/// SQLx-based settings repository implementation
pub struct SqlxSettingsRepository {
    pool: DynDatabasePool,
}

impl SqlxSettingsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SettingsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SettingsRepository for SqlxSettingsRepository {
    async fn get(&self) -> Result<Option<SiteSettings>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => get_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn create_default(&self) -> Result<SiteSettings> {
        let created = match self.pool.driver() {
            DatabaseDriver::Sqlite => create_default_sqlite(self.pool.as_sqlite().unwrap()).await?,
            DatabaseDriver::Mysql => create_default_mysql(self.pool.as_mysql().unwrap()).await?,
        };
        self.get()
            .await?
            .with_context(|| format!("Settings row {} missing after insert", created))
    }

    async fn update(&self, settings: &SiteSettings) -> Result<SiteSettings> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), settings).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), settings).await,
        }
    }
}

const SELECT_SETTINGS: &str = r#"
    SELECT id, site_name, logo_url, google_analytics_id, header_ad_html, footer_ad_html,
           banner_title, banner_subtitle, banner_description, banner_bg_color, banner_bg_image,
           banner_text_color, banner_btn1_text, banner_btn1_link, banner_btn1_color,
           banner_btn2_text, banner_btn2_link, banner_btn2_color, header_bg_color,
           header_text_color, footer_bg_color, footer_text_color, footer_description, updated_at
    FROM site_settings
    ORDER BY id ASC
    LIMIT 1
"#;

const UPDATE_SETTINGS: &str = r#"
    UPDATE site_settings SET
        site_name = ?, logo_url = ?, google_analytics_id = ?, header_ad_html = ?,
        footer_ad_html = ?, banner_title = ?, banner_subtitle = ?, banner_description = ?,
        banner_bg_color = ?, banner_bg_image = ?, banner_text_color = ?, banner_btn1_text = ?,
        banner_btn1_link = ?, banner_btn1_color = ?, banner_btn2_text = ?, banner_btn2_link = ?,
        banner_btn2_color = ?, header_bg_color = ?, header_text_color = ?, footer_bg_color = ?,
        footer_text_color = ?, footer_description = ?, updated_at = ?
    WHERE id = ?
"#;

macro_rules! settings_from_row {
    ($row:expr) => {{
        let row = $row;
        SiteSettings {
            id: row.get("id"),
            site_name: row.get("site_name"),
            logo_url: row.get("logo_url"),
            google_analytics_id: row.get("google_analytics_id"),
            header_ad_html: row.get("header_ad_html"),
            footer_ad_html: row.get("footer_ad_html"),
            banner_title: row.get("banner_title"),
            banner_subtitle: row.get("banner_subtitle"),
            banner_description: row.get("banner_description"),
            banner_bg_color: row.get("banner_bg_color"),
            banner_bg_image: row.get("banner_bg_image"),
            banner_text_color: row.get("banner_text_color"),
            banner_btn1_text: row.get("banner_btn1_text"),
            banner_btn1_link: row.get("banner_btn1_link"),
            banner_btn1_color: row.get("banner_btn1_color"),
            banner_btn2_text: row.get("banner_btn2_text"),
            banner_btn2_link: row.get("banner_btn2_link"),
            banner_btn2_color: row.get("banner_btn2_color"),
            header_bg_color: row.get("header_bg_color"),
            header_text_color: row.get("header_text_color"),
            footer_bg_color: row.get("footer_bg_color"),
            footer_text_color: row.get("footer_text_color"),
            footer_description: row.get("footer_description"),
            updated_at: row.get("updated_at"),
        }
    }};
}

// Bind order matches UPDATE_SETTINGS
macro_rules! bind_settings {
    ($query:expr, $settings:expr) => {{
        let s = $settings;
        $query
            .bind(&s.site_name)
            .bind(&s.logo_url)
            .bind(&s.google_analytics_id)
            .bind(&s.header_ad_html)
            .bind(&s.footer_ad_html)
            .bind(&s.banner_title)
            .bind(&s.banner_subtitle)
            .bind(&s.banner_description)
            .bind(&s.banner_bg_color)
            .bind(&s.banner_bg_image)
            .bind(&s.banner_text_color)
            .bind(&s.banner_btn1_text)
            .bind(&s.banner_btn1_link)
            .bind(&s.banner_btn1_color)
            .bind(&s.banner_btn2_text)
            .bind(&s.banner_btn2_link)
            .bind(&s.banner_btn2_color)
            .bind(&s.header_bg_color)
            .bind(&s.header_text_color)
            .bind(&s.footer_bg_color)
            .bind(&s.footer_text_color)
            .bind(&s.footer_description)
    }};
}

fn row_to_settings_sqlite(row: &SqliteRow) -> SiteSettings {
    settings_from_row!(row)
}

fn row_to_settings_mysql(row: &MySqlRow) -> SiteSettings {
    settings_from_row!(row)
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_sqlite(pool: &SqlitePool) -> Result<Option<SiteSettings>> {
    let row = sqlx::query(SELECT_SETTINGS)
        .fetch_optional(pool)
        .await
        .context("Failed to get site settings")?;

    Ok(row.as_ref().map(row_to_settings_sqlite))
}

async fn create_default_sqlite(pool: &SqlitePool) -> Result<i64> {
    let result = sqlx::query("INSERT INTO site_settings (site_name, updated_at) VALUES (?, ?)")
        .bind(DEFAULT_SITE_NAME)
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to create site settings")?;

    Ok(result.last_insert_rowid())
}

async fn update_sqlite(pool: &SqlitePool, settings: &SiteSettings) -> Result<SiteSettings> {
    let now = Utc::now();

    bind_settings!(sqlx::query(UPDATE_SETTINGS), settings)
        .bind(now)
        .bind(settings.id)
        .execute(pool)
        .await
        .context("Failed to update site settings")?;

    Ok(SiteSettings {
        updated_at: now,
        ..settings.clone()
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn get_mysql(pool: &MySqlPool) -> Result<Option<SiteSettings>> {
    let row = sqlx::query(SELECT_SETTINGS)
        .fetch_optional(pool)
        .await
        .context("Failed to get site settings")?;

    Ok(row.as_ref().map(row_to_settings_mysql))
}

async fn create_default_mysql(pool: &MySqlPool) -> Result<i64> {
    let result = sqlx::query("INSERT INTO site_settings (site_name, updated_at) VALUES (?, ?)")
        .bind(DEFAULT_SITE_NAME)
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to create site settings")?;

    Ok(result.last_insert_id() as i64)
}

async fn update_mysql(pool: &MySqlPool, settings: &SiteSettings) -> Result<SiteSettings> {
    let now = Utc::now();

    bind_settings!(sqlx::query(UPDATE_SETTINGS), settings)
        .bind(now)
        .bind(settings.id)
        .execute(pool)
        .await
        .context("Failed to update site settings")?;

    Ok(SiteSettings {
        updated_at: now,
        ..settings.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;

    #[tokio::test]
    async fn test_get_is_empty_until_created() {
        let repo = SqlxSettingsRepository::new(migrated_pool().await);
        assert!(repo.get().await.unwrap().is_none());

        let created = repo.create_default().await.unwrap();
        assert_eq!(created.site_name, DEFAULT_SITE_NAME);
        assert!(created.logo_url.is_none());

        let fetched = repo.get().await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
    }

    #[tokio::test]
    async fn test_update_round_trips_every_column() {
        let repo = SqlxSettingsRepository::new(migrated_pool().await);
        let mut settings = repo.create_default().await.unwrap();

        settings.site_name = "Shelf".to_string();
        settings.banner_title = Some("Read more".to_string());
        settings.footer_description = Some("Made with care".to_string());
        settings.banner_btn2_color = Some("#ff0000".to_string());
        repo.update(&settings).await.unwrap();

        let fetched = repo.get().await.unwrap().unwrap();
        assert_eq!(fetched.site_name, "Shelf");
        assert_eq!(fetched.banner_title.as_deref(), Some("Read more"));
        assert_eq!(fetched.footer_description.as_deref(), Some("Made with care"));
        assert_eq!(fetched.banner_btn2_color.as_deref(), Some("#ff0000"));
    }
}
