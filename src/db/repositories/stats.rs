//! Content statistics repository
//!
//! Daily view/click counters per content item. Every event updates the
//! daily row and the lifetime totals on `contents` in one transaction.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::parse_enum;
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{DailyTotals, StatEvent, TopContent};

/// Stats repository trait
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Count one event for `content_id` on `date` (`YYYY-MM-DD`)
    async fn record_event(&self, content_id: i64, date: &str, event: StatEvent) -> Result<()>;

    /// Site-wide totals per day from `from_date` on, oldest first
    async fn daily_totals(&self, from_date: &str) -> Result<Vec<DailyTotals>>;

    /// Items with the most clicks from `from_date` on
    async fn top_content(&self, from_date: &str, limit: i64) -> Result<Vec<TopContent>>;
}

/// SQLx-based stats repository implementation
pub struct SqlxStatsRepository {
    pool: DynDatabasePool,
}

impl SqlxStatsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn StatsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl StatsRepository for SqlxStatsRepository {
    async fn record_event(&self, content_id: i64, date: &str, event: StatEvent) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                record_event_sqlite(self.pool.as_sqlite().unwrap(), content_id, date, event).await
            }
            DatabaseDriver::Mysql => {
                record_event_mysql(self.pool.as_mysql().unwrap(), content_id, date, event).await
            }
        }
    }

    async fn daily_totals(&self, from_date: &str) -> Result<Vec<DailyTotals>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                daily_totals_sqlite(self.pool.as_sqlite().unwrap(), from_date).await
            }
            DatabaseDriver::Mysql => daily_totals_mysql(self.pool.as_mysql().unwrap(), from_date).await,
        }
    }

    async fn top_content(&self, from_date: &str, limit: i64) -> Result<Vec<TopContent>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                top_content_sqlite(self.pool.as_sqlite().unwrap(), from_date, limit).await
            }
            DatabaseDriver::Mysql => {
                top_content_mysql(self.pool.as_mysql().unwrap(), from_date, limit).await
            }
        }
    }
}

/// `(views, clicks)` increments for one event
fn deltas(event: StatEvent) -> (i64, i64) {
    match event {
        StatEvent::View => (1, 0),
        StatEvent::Click => (0, 1),
    }
}

const UPDATE_TOTALS: &str =
    "UPDATE contents SET views_total = views_total + ?, clicks_total = clicks_total + ? WHERE id = ?";

macro_rules! top_content_from_row {
    ($row:expr) => {{
        let row = $row;
        let views: i64 = row.get("total_views");
        let clicks: i64 = row.get("total_clicks");
        Ok::<_, anyhow::Error>(TopContent {
            content_id: row.get("content_id"),
            title: row.get("title"),
            slug: row.get("slug"),
            content_type: parse_enum(row.get::<String, _>("content_type").as_str())?,
            total_views: views,
            total_clicks: clicks,
            ctr: TopContent::click_through_rate(views, clicks),
        })
    }};
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn record_event_sqlite(
    pool: &SqlitePool,
    content_id: i64,
    date: &str,
    event: StatEvent,
) -> Result<()> {
    let (views, clicks) = deltas(event);
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        r#"
        INSERT INTO content_stats (content_id, date, views, clicks) VALUES (?, ?, ?, ?)
        ON CONFLICT(content_id, date) DO UPDATE SET
            views = views + excluded.views,
            clicks = clicks + excluded.clicks
        "#,
    )
    .bind(content_id)
    .bind(date)
    .bind(views)
    .bind(clicks)
    .execute(&mut *tx)
    .await
    .context("Failed to upsert content stats")?;

    sqlx::query(UPDATE_TOTALS)
        .bind(views)
        .bind(clicks)
        .bind(content_id)
        .execute(&mut *tx)
        .await
        .context("Failed to update content totals")?;

    tx.commit().await.context("Failed to commit stats")?;
    Ok(())
}

async fn daily_totals_sqlite(pool: &SqlitePool, from_date: &str) -> Result<Vec<DailyTotals>> {
    let rows = sqlx::query(
        r#"
        SELECT date, SUM(views) AS views, SUM(clicks) AS clicks
        FROM content_stats WHERE date >= ?
        GROUP BY date ORDER BY date ASC
        "#,
    )
    .bind(from_date)
    .fetch_all(pool)
    .await
    .context("Failed to load daily totals")?;

    Ok(rows
        .iter()
        .map(|row| DailyTotals {
            date: row.get("date"),
            views: row.get("views"),
            clicks: row.get("clicks"),
        })
        .collect())
}

async fn top_content_sqlite(pool: &SqlitePool, from_date: &str, limit: i64) -> Result<Vec<TopContent>> {
    let rows = sqlx::query(
        r#"
        SELECT s.content_id, c.title, c.slug, c.content_type,
               SUM(s.views) AS total_views, SUM(s.clicks) AS total_clicks
        FROM content_stats s JOIN contents c ON c.id = s.content_id
        WHERE s.date >= ?
        GROUP BY s.content_id, c.title, c.slug, c.content_type
        ORDER BY total_clicks DESC, s.content_id ASC
        LIMIT ?
        "#,
    )
    .bind(from_date)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to load top content")?;

    rows.iter()
        .map(|row| -> Result<TopContent> { top_content_from_row!(row) })
        .collect()
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn record_event_mysql(
    pool: &MySqlPool,
    content_id: i64,
    date: &str,
    event: StatEvent,
) -> Result<()> {
    let (views, clicks) = deltas(event);
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query(
        r#"
        INSERT INTO content_stats (content_id, date, views, clicks) VALUES (?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            views = views + VALUES(views),
            clicks = clicks + VALUES(clicks)
        "#,
    )
    .bind(content_id)
    .bind(date)
    .bind(views)
    .bind(clicks)
    .execute(&mut *tx)
    .await
    .context("Failed to upsert content stats")?;

    sqlx::query(UPDATE_TOTALS)
        .bind(views)
        .bind(clicks)
        .bind(content_id)
        .execute(&mut *tx)
        .await
        .context("Failed to update content totals")?;

    tx.commit().await.context("Failed to commit stats")?;
    Ok(())
}

async fn daily_totals_mysql(pool: &MySqlPool, from_date: &str) -> Result<Vec<DailyTotals>> {
    let rows = sqlx::query(
        r#"
        SELECT date, CAST(SUM(views) AS SIGNED) AS views, CAST(SUM(clicks) AS SIGNED) AS clicks
        FROM content_stats WHERE date >= ?
        GROUP BY date ORDER BY date ASC
        "#,
    )
    .bind(from_date)
    .fetch_all(pool)
    .await
    .context("Failed to load daily totals")?;

    Ok(rows
        .iter()
        .map(|row| DailyTotals {
            date: row.get("date"),
            views: row.get("views"),
            clicks: row.get("clicks"),
        })
        .collect())
}

async fn top_content_mysql(pool: &MySqlPool, from_date: &str, limit: i64) -> Result<Vec<TopContent>> {
    let rows = sqlx::query(
        r#"
        SELECT s.content_id, c.title, c.slug, c.content_type,
               CAST(SUM(s.views) AS SIGNED) AS total_views,
               CAST(SUM(s.clicks) AS SIGNED) AS total_clicks
        FROM content_stats s JOIN contents c ON c.id = s.content_id
        WHERE s.date >= ?
        GROUP BY s.content_id, c.title, c.slug, c.content_type
        ORDER BY total_clicks DESC, s.content_id ASC
        LIMIT ?
        "#,
    )
    .bind(from_date)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to load top content")?;

    rows.iter()
        .map(|row| -> Result<TopContent> { top_content_from_row!(row) })
        .collect()
}
