//! Content report repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{mysql::MySqlRow, sqlite::SqliteRow, MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::content::{content_summary_from_row, CONTENT_SUMMARY_COLUMNS};
use super::parse_enum;
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{ContentReport, ReportStatus, ReportWithContent};

/// Report repository trait
#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn create(&self, report: &ContentReport) -> Result<ContentReport>;

    async fn get_by_id(&self, id: i64) -> Result<Option<ContentReport>>;

    /// Newest first, optionally filtered by status
    async fn list(&self, status: Option<ReportStatus>) -> Result<Vec<ReportWithContent>>;

    /// Returns false if the report does not exist
    async fn update_status(&self, id: i64, status: ReportStatus) -> Result<bool>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based report repository implementation
pub struct SqlxReportRepository {
    pool: DynDatabasePool,
}

impl SqlxReportRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ReportRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ReportRepository for SqlxReportRepository {
    async fn create(&self, report: &ContentReport) -> Result<ContentReport> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), report).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), report).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ContentReport>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(&self, status: Option<ReportStatus>) -> Result<Vec<ReportWithContent>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_sqlite(self.pool.as_sqlite().unwrap(), status).await,
            DatabaseDriver::Mysql => list_mysql(self.pool.as_mysql().unwrap(), status).await,
        }
    }

    async fn update_status(&self, id: i64, status: ReportStatus) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_status_sqlite(self.pool.as_sqlite().unwrap(), id, status).await
            }
            DatabaseDriver::Mysql => {
                update_status_mysql(self.pool.as_mysql().unwrap(), id, status).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const REPORT_COLUMNS: &str = "r.id, r.content_id, r.reason, r.details, r.reporter_ip, r.status, \
     r.created_at, r.updated_at";

const INSERT_REPORT: &str = r#"
    INSERT INTO content_reports (content_id, reason, details, reporter_ip, status, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

fn list_sql() -> String {
    format!(
        "SELECT {}, {} FROM content_reports r JOIN contents c ON c.id = r.content_id \
         WHERE (? IS NULL OR r.status = ?) ORDER BY r.created_at DESC, r.id DESC",
        REPORT_COLUMNS, CONTENT_SUMMARY_COLUMNS
    )
}

macro_rules! report_from_row {
    ($row:expr) => {{
        let row = $row;
        Ok::<_, anyhow::Error>(ContentReport {
            id: row.get("id"),
            content_id: row.get("content_id"),
            reason: row.get("reason"),
            details: row.get("details"),
            reporter_ip: row.get("reporter_ip"),
            status: parse_enum(row.get::<String, _>("status").as_str())?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }};
}

fn row_to_report_sqlite(row: &SqliteRow) -> Result<ContentReport> {
    report_from_row!(row)
}

fn row_to_report_mysql(row: &MySqlRow) -> Result<ContentReport> {
    report_from_row!(row)
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_sqlite(pool: &SqlitePool, report: &ContentReport) -> Result<ContentReport> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_REPORT)
        .bind(report.content_id)
        .bind(&report.reason)
        .bind(&report.details)
        .bind(&report.reporter_ip)
        .bind(report.status.as_str())
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create report")?;

    Ok(ContentReport {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..report.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<ContentReport>> {
    let sql = format!("SELECT {} FROM content_reports r WHERE r.id = ?", REPORT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get report by ID")?;

    row.as_ref().map(row_to_report_sqlite).transpose()
}

async fn list_sqlite(pool: &SqlitePool, status: Option<ReportStatus>) -> Result<Vec<ReportWithContent>> {
    let status = status.map(|s| s.as_str());
    let rows = sqlx::query(&list_sql())
        .bind(status)
        .bind(status)
        .fetch_all(pool)
        .await
        .context("Failed to list reports")?;

    rows.iter()
        .map(|row| -> Result<ReportWithContent> {
            Ok(ReportWithContent {
                report: row_to_report_sqlite(row)?,
                content: content_summary_from_row!(row)?,
            })
        })
        .collect()
}

async fn update_status_sqlite(pool: &SqlitePool, id: i64, status: ReportStatus) -> Result<bool> {
    let result = sqlx::query("UPDATE content_reports SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update report status")?;

    Ok(result.rows_affected() > 0)
}

async fn delete_sqlite(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM content_reports WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete report")?;

    Ok(result.rows_affected() > 0)
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_mysql(pool: &MySqlPool, report: &ContentReport) -> Result<ContentReport> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_REPORT)
        .bind(report.content_id)
        .bind(&report.reason)
        .bind(&report.details)
        .bind(&report.reporter_ip)
        .bind(report.status.as_str())
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create report")?;

    Ok(ContentReport {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..report.clone()
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<ContentReport>> {
    let sql = format!("SELECT {} FROM content_reports r WHERE r.id = ?", REPORT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get report by ID")?;

    row.as_ref().map(row_to_report_mysql).transpose()
}

async fn list_mysql(pool: &MySqlPool, status: Option<ReportStatus>) -> Result<Vec<ReportWithContent>> {
    let status = status.map(|s| s.as_str());
    let rows = sqlx::query(&list_sql())
        .bind(status)
        .bind(status)
        .fetch_all(pool)
        .await
        .context("Failed to list reports")?;

    rows.iter()
        .map(|row| -> Result<ReportWithContent> {
            Ok(ReportWithContent {
                report: row_to_report_mysql(row)?,
                content: content_summary_from_row!(row)?,
            })
        })
        .collect()
}

async fn update_status_mysql(pool: &MySqlPool, id: i64, status: ReportStatus) -> Result<bool> {
    let result = sqlx::query("UPDATE content_reports SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update report status")?;

    Ok(result.rows_affected() > 0)
}

async fn delete_mysql(pool: &MySqlPool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM content_reports WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete report")?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_content, migrated_pool};

    fn report(content_id: i64, reason: &str) -> ContentReport {
        let now = Utc::now();
        ContentReport {
            id: 0,
            content_id,
            reason: reason.to_string(),
            details: None,
            reporter_ip: Some("203.0.113.9".to_string()),
            status: ReportStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_list_and_filter() {
        let pool = migrated_pool().await;
        let repo = SqlxReportRepository::new(pool.clone());
        let content = insert_content(&pool, "gantz").await;

        let first = repo.create(&report(content.id, "Broken link")).await.unwrap();
        let second = repo.create(&report(content.id, "Wrong title")).await.unwrap();
        assert!(repo.update_status(second.id, ReportStatus::Resolved).await.unwrap());

        let all = repo.list(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].content.slug, "gantz");

        let pending = repo.list(Some(ReportStatus::Pending)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].report.id, first.id);
    }

    #[tokio::test]
    async fn test_update_missing_and_delete() {
        let pool = migrated_pool().await;
        let repo = SqlxReportRepository::new(pool.clone());
        let content = insert_content(&pool, "claymore").await;
        let created = repo.create(&report(content.id, "Spam")).await.unwrap();

        assert!(!repo.update_status(created.id + 100, ReportStatus::Dismissed).await.unwrap());
        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
