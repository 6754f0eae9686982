//! Content link repository
//!
//! Source links of content items, joined with partner and content summaries,
//! plus the per-link click log.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{mysql::MySqlRow, sqlite::SqliteRow, MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::content::{content_summary_from_row, CONTENT_SUMMARY_COLUMNS};
use super::{parse_enum, placeholders};
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{AdminLink, ContentLink, LinkStatus, LinkWithPartner, NewLinkClick, PartnerSummary};

/// Link repository trait
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Insert a link. `link.id` and `link.click_count` are ignored.
    async fn create(&self, link: &ContentLink) -> Result<ContentLink>;

    async fn get_by_id(&self, id: i64) -> Result<Option<ContentLink>>;

    /// Admin listing, optionally for one content item
    async fn list(&self, content_id: Option<i64>) -> Result<Vec<AdminLink>>;

    /// Verified links of one item as shown to visitors
    async fn verified_for_content(&self, content_id: i64) -> Result<Vec<LinkWithPartner>>;

    /// Every link of one item, verified first, then unverified, then blocked
    async fn all_for_content(&self, content_id: i64) -> Result<Vec<LinkWithPartner>>;

    /// Links of several items at once
    async fn links_for_contents(&self, content_ids: &[i64]) -> Result<Vec<ContentLink>>;

    /// Highest priority verified link of an item
    async fn top_verified(&self, content_id: i64) -> Result<Option<LinkWithPartner>>;

    async fn update(&self, link: &ContentLink) -> Result<ContentLink>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn increment_click(&self, id: i64) -> Result<()>;

    /// Append to the click log
    async fn record_click(&self, link: &ContentLink, click: &NewLinkClick) -> Result<()>;
}

/// SQLx-based link repository implementation
pub struct SqlxLinkRepository {
    pool: DynDatabasePool,
}

impl SqlxLinkRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn LinkRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl LinkRepository for SqlxLinkRepository {
    async fn create(&self, link: &ContentLink) -> Result<ContentLink> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), link).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), link).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ContentLink>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(&self, content_id: Option<i64>) -> Result<Vec<AdminLink>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), content_id).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), content_id).await,
        }
    }

    async fn verified_for_content(&self, content_id: i64) -> Result<Vec<LinkWithPartner>> {
        let sql = with_partner_sql(VERIFIED_FILTER, VERIFIED_ORDER, None);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                with_partner_sqlite(self.pool.as_sqlite().unwrap(), &sql, content_id).await
            }
            DatabaseDriver::Mysql => {
                with_partner_mysql(self.pool.as_mysql().unwrap(), &sql, content_id).await
            }
        }
    }

    async fn all_for_content(&self, content_id: i64) -> Result<Vec<LinkWithPartner>> {
        let sql = with_partner_sql("l.content_id = ?", STATUS_ORDER, None);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                with_partner_sqlite(self.pool.as_sqlite().unwrap(), &sql, content_id).await
            }
            DatabaseDriver::Mysql => {
                with_partner_mysql(self.pool.as_mysql().unwrap(), &sql, content_id).await
            }
        }
    }

    async fn links_for_contents(&self, content_ids: &[i64]) -> Result<Vec<ContentLink>> {
        if content_ids.is_empty() {
            return Ok(Vec::new());
        }
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                links_for_contents_sqlite(self.pool.as_sqlite().unwrap(), content_ids).await
            }
            DatabaseDriver::Mysql => {
                links_for_contents_mysql(self.pool.as_mysql().unwrap(), content_ids).await
            }
        }
    }

    async fn top_verified(&self, content_id: i64) -> Result<Option<LinkWithPartner>> {
        let sql = with_partner_sql(VERIFIED_FILTER, TOP_ORDER, Some(1));
        let links = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                with_partner_sqlite(self.pool.as_sqlite().unwrap(), &sql, content_id).await?
            }
            DatabaseDriver::Mysql => {
                with_partner_mysql(self.pool.as_mysql().unwrap(), &sql, content_id).await?
            }
        };
        Ok(links.into_iter().next())
    }

    async fn update(&self, link: &ContentLink) -> Result<ContentLink> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_sqlite(self.pool.as_sqlite().unwrap(), link).await,
            DatabaseDriver::Mysql => update_mysql(self.pool.as_mysql().unwrap(), link).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn increment_click(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                increment_click_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => increment_click_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn record_click(&self, link: &ContentLink, click: &NewLinkClick) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                record_click_sqlite(self.pool.as_sqlite().unwrap(), link, click).await
            }
            DatabaseDriver::Mysql => {
                record_click_mysql(self.pool.as_mysql().unwrap(), link, click).await
            }
        }
    }
}

// ============================================================================
// Shared SQL
// ============================================================================

const LINK_COLUMNS: &str = "l.id, l.content_id, l.url, l.source_name, l.link_type, l.status, \
     l.priority, l.partner_id, l.click_count, l.created_at, l.updated_at";

const PARTNER_COLUMNS: &str = "p.id AS partner_ref_id, p.name AS partner_name, \
     p.is_verified AS partner_is_verified, p.logo_url AS partner_logo_url";

const VERIFIED_FILTER: &str = "l.content_id = ? AND l.status = 'VERIFIED'";

const VERIFIED_ORDER: &str =
    "l.priority DESC, COALESCE(p.priority_score, 0) DESC, l.created_at DESC, l.id ASC";

const TOP_ORDER: &str = "l.priority DESC, l.created_at DESC, l.id ASC";

const STATUS_ORDER: &str = "CASE l.status WHEN 'VERIFIED' THEN 0 WHEN 'UNVERIFIED' THEN 1 ELSE 2 END, \
     l.priority DESC, l.created_at DESC, l.id ASC";

const INSERT_LINK: &str = r#"
    INSERT INTO content_links (content_id, url, source_name, link_type, status, priority,
        partner_id, click_count, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
"#;

const UPDATE_LINK: &str = r#"
    UPDATE content_links
    SET url = ?, source_name = ?, link_type = ?, status = ?, priority = ?, partner_id = ?,
        updated_at = ?
    WHERE id = ?
"#;

const INSERT_CLICK: &str = r#"
    INSERT INTO link_clicks (link_id, content_id, user_agent, ip_address, referrer, created_at)
    VALUES (?, ?, ?, ?, ?, ?)
"#;

fn with_partner_sql(filter: &str, order: &str, limit: Option<i64>) -> String {
    let limit = limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    format!(
        "SELECT {}, {} FROM content_links l LEFT JOIN partners p ON p.id = l.partner_id \
         WHERE {} ORDER BY {}{}",
        LINK_COLUMNS, PARTNER_COLUMNS, filter, order, limit
    )
}

fn admin_list_sql(filtered: bool) -> String {
    let filter = if filtered { "WHERE l.content_id = ? " } else { "" };
    format!(
        "SELECT {}, {}, {} FROM content_links l \
         JOIN contents c ON c.id = l.content_id \
         LEFT JOIN partners p ON p.id = l.partner_id \
         {}ORDER BY l.priority DESC, l.created_at DESC, l.id ASC",
        LINK_COLUMNS, PARTNER_COLUMNS, CONTENT_SUMMARY_COLUMNS, filter
    )
}

macro_rules! link_from_row {
    ($row:expr) => {{
        let row = $row;
        Ok::<_, anyhow::Error>(ContentLink {
            id: row.get("id"),
            content_id: row.get("content_id"),
            url: row.get("url"),
            source_name: row.get("source_name"),
            link_type: parse_enum(row.get::<String, _>("link_type").as_str())?,
            status: parse_enum(row.get::<String, _>("status").as_str())?,
            priority: row.get("priority"),
            partner_id: row.get("partner_id"),
            click_count: row.get("click_count"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }};
}

macro_rules! partner_summary_from_row {
    ($row:expr) => {{
        let row = $row;
        row.get::<Option<i64>, _>("partner_ref_id")
            .map(|id| PartnerSummary {
                id,
                name: row.get("partner_name"),
                is_verified: row.get("partner_is_verified"),
                logo_url: row.get("partner_logo_url"),
            })
    }};
}

fn row_to_link_sqlite(row: &SqliteRow) -> Result<ContentLink> {
    link_from_row!(row)
}

fn row_to_link_mysql(row: &MySqlRow) -> Result<ContentLink> {
    link_from_row!(row)
}

fn row_to_link_with_partner_sqlite(row: &SqliteRow) -> Result<LinkWithPartner> {
    Ok(LinkWithPartner {
        link: row_to_link_sqlite(row)?,
        partner: partner_summary_from_row!(row),
    })
}

fn row_to_link_with_partner_mysql(row: &MySqlRow) -> Result<LinkWithPartner> {
    Ok(LinkWithPartner {
        link: row_to_link_mysql(row)?,
        partner: partner_summary_from_row!(row),
    })
}

fn row_to_admin_link_sqlite(row: &SqliteRow) -> Result<AdminLink> {
    Ok(AdminLink {
        link: row_to_link_sqlite(row)?,
        partner: partner_summary_from_row!(row),
        content: content_summary_from_row!(row)?,
    })
}

fn row_to_admin_link_mysql(row: &MySqlRow) -> Result<AdminLink> {
    Ok(AdminLink {
        link: row_to_link_mysql(row)?,
        partner: partner_summary_from_row!(row),
        content: content_summary_from_row!(row)?,
    })
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, link: &ContentLink) -> Result<ContentLink> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_LINK)
        .bind(link.content_id)
        .bind(&link.url)
        .bind(&link.source_name)
        .bind(link.link_type.as_str())
        .bind(link.status.as_str())
        .bind(link.priority)
        .bind(link.partner_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create link")?;

    Ok(ContentLink {
        id: result.last_insert_rowid(),
        click_count: 0,
        created_at: now,
        updated_at: now,
        ..link.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<ContentLink>> {
    let sql = format!("SELECT {} FROM content_links l WHERE l.id = ?", LINK_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get link by ID")?;

    row.as_ref().map(row_to_link_sqlite).transpose()
}

async fn list_sqlite(pool: &SqlitePool, content_id: Option<i64>) -> Result<Vec<AdminLink>> {
    let sql = admin_list_sql(content_id.is_some());
    let mut query = sqlx::query(&sql);
    if let Some(content_id) = content_id {
        query = query.bind(content_id);
    }
    let rows = query.fetch_all(pool).await.context("Failed to list links")?;

    rows.iter().map(row_to_admin_link_sqlite).collect()
}

async fn with_partner_sqlite(
    pool: &SqlitePool,
    sql: &str,
    content_id: i64,
) -> Result<Vec<LinkWithPartner>> {
    let rows = sqlx::query(sql)
        .bind(content_id)
        .fetch_all(pool)
        .await
        .context("Failed to list content links")?;

    rows.iter().map(row_to_link_with_partner_sqlite).collect()
}

async fn links_for_contents_sqlite(pool: &SqlitePool, content_ids: &[i64]) -> Result<Vec<ContentLink>> {
    let sql = format!(
        "SELECT {} FROM content_links l WHERE l.content_id IN ({}) ORDER BY {}",
        LINK_COLUMNS,
        placeholders(content_ids.len()),
        TOP_ORDER
    );
    let mut query = sqlx::query(&sql);
    for id in content_ids {
        query = query.bind(id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load content links")?;

    rows.iter().map(row_to_link_sqlite).collect()
}

async fn update_sqlite(pool: &SqlitePool, link: &ContentLink) -> Result<ContentLink> {
    let now = Utc::now();

    sqlx::query(UPDATE_LINK)
        .bind(&link.url)
        .bind(&link.source_name)
        .bind(link.link_type.as_str())
        .bind(link.status.as_str())
        .bind(link.priority)
        .bind(link.partner_id)
        .bind(now)
        .bind(link.id)
        .execute(pool)
        .await
        .context("Failed to update link")?;

    Ok(ContentLink {
        updated_at: now,
        ..link.clone()
    })
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM content_links WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete link")?;

    Ok(result.rows_affected() > 0)
}

async fn increment_click_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("UPDATE content_links SET click_count = click_count + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to increment link clicks")?;
    Ok(())
}

async fn record_click_sqlite(pool: &SqlitePool, link: &ContentLink, click: &NewLinkClick) -> Result<()> {
    sqlx::query(INSERT_CLICK)
        .bind(link.id)
        .bind(link.content_id)
        .bind(&click.user_agent)
        .bind(&click.ip_address)
        .bind(&click.referrer)
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to record link click")?;
    Ok(())
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, link: &ContentLink) -> Result<ContentLink> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_LINK)
        .bind(link.content_id)
        .bind(&link.url)
        .bind(&link.source_name)
        .bind(link.link_type.as_str())
        .bind(link.status.as_str())
        .bind(link.priority)
        .bind(link.partner_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create link")?;

    Ok(ContentLink {
        id: result.last_insert_id() as i64,
        click_count: 0,
        created_at: now,
        updated_at: now,
        ..link.clone()
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<ContentLink>> {
    let sql = format!("SELECT {} FROM content_links l WHERE l.id = ?", LINK_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get link by ID")?;

    row.as_ref().map(row_to_link_mysql).transpose()
}

async fn list_mysql(pool: &MySqlPool, content_id: Option<i64>) -> Result<Vec<AdminLink>> {
    let sql = admin_list_sql(content_id.is_some());
    let mut query = sqlx::query(&sql);
    if let Some(content_id) = content_id {
        query = query.bind(content_id);
    }
    let rows = query.fetch_all(pool).await.context("Failed to list links")?;

    rows.iter().map(row_to_admin_link_mysql).collect()
}

async fn with_partner_mysql(
    pool: &MySqlPool,
    sql: &str,
    content_id: i64,
) -> Result<Vec<LinkWithPartner>> {
    let rows = sqlx::query(sql)
        .bind(content_id)
        .fetch_all(pool)
        .await
        .context("Failed to list content links")?;

    rows.iter().map(row_to_link_with_partner_mysql).collect()
}

async fn links_for_contents_mysql(pool: &MySqlPool, content_ids: &[i64]) -> Result<Vec<ContentLink>> {
    let sql = format!(
        "SELECT {} FROM content_links l WHERE l.content_id IN ({}) ORDER BY {}",
        LINK_COLUMNS,
        placeholders(content_ids.len()),
        TOP_ORDER
    );
    let mut query = sqlx::query(&sql);
    for id in content_ids {
        query = query.bind(id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load content links")?;

    rows.iter().map(row_to_link_mysql).collect()
}

async fn update_mysql(pool: &MySqlPool, link: &ContentLink) -> Result<ContentLink> {
    let now = Utc::now();

    sqlx::query(UPDATE_LINK)
        .bind(&link.url)
        .bind(&link.source_name)
        .bind(link.link_type.as_str())
        .bind(link.status.as_str())
        .bind(link.priority)
        .bind(link.partner_id)
        .bind(now)
        .bind(link.id)
        .execute(pool)
        .await
        .context("Failed to update link")?;

    Ok(ContentLink {
        updated_at: now,
        ..link.clone()
    })
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM content_links WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete link")?;

    Ok(result.rows_affected() > 0)
}

async fn increment_click_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("UPDATE content_links SET click_count = click_count + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to increment link clicks")?;
    Ok(())
}

async fn record_click_mysql(pool: &MySqlPool, link: &ContentLink, click: &NewLinkClick) -> Result<()> {
    sqlx::query(INSERT_CLICK)
        .bind(link.id)
        .bind(link.content_id)
        .bind(&click.user_agent)
        .bind(&click.ip_address)
        .bind(&click.referrer)
        .bind(Utc::now())
        .execute(pool)
        .await
        .context("Failed to record link click")?;
    Ok(())
}

/// Build an unsaved link for tests and services
pub fn new_link(
    content_id: i64,
    url: impl Into<String>,
    source_name: impl Into<String>,
    link_type: crate::models::LinkType,
    status: LinkStatus,
    priority: i32,
    partner_id: Option<i64>,
) -> ContentLink {
    let now = Utc::now();
    ContentLink {
        id: 0,
        content_id,
        url: url.into(),
        source_name: source_name.into(),
        link_type,
        status,
        priority,
        partner_id,
        click_count: 0,
        created_at: now,
        updated_at: now,
    }
}
