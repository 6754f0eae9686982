//! Admin user repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{mysql::MySqlRow, sqlite::SqliteRow, MySqlPool, Row, SqlitePool};
use std::sync::Arc;

use super::parse_enum;
use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::AdminUser;

/// Admin repository trait
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Number of admin accounts
    async fn count(&self) -> Result<i64>;

    async fn create(&self, admin: &AdminUser) -> Result<AdminUser>;

    async fn get_by_id(&self, id: i64) -> Result<Option<AdminUser>>;

    /// Lookup by email (stored lowercased)
    async fn get_by_email(&self, email: &str) -> Result<Option<AdminUser>>;
}

/// SQLx-based admin repository implementation
pub struct SqlxAdminRepository {
    pool: DynDatabasePool,
}

impl SqlxAdminRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AdminRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AdminRepository for SqlxAdminRepository {
    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => count_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn create(&self, admin: &AdminUser) -> Result<AdminUser> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_sqlite(self.pool.as_sqlite().unwrap(), admin).await,
            DatabaseDriver::Mysql => create_mysql(self.pool.as_mysql().unwrap(), admin).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<AdminUser>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<AdminUser>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_by_email_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => get_by_email_mysql(self.pool.as_mysql().unwrap(), email).await,
        }
    }
}

const SELECT_ADMIN: &str =
    "SELECT id, name, email, password_hash, role, status, created_at, updated_at FROM admin_users";

const INSERT_ADMIN: &str = r#"
    INSERT INTO admin_users (name, email, password_hash, role, status, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

macro_rules! admin_from_row {
    ($row:expr) => {{
        let row = $row;
        Ok(AdminUser {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            role: parse_enum(row.get::<String, _>("role").as_str())?,
            status: parse_enum(row.get::<String, _>("status").as_str())?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }};
}

fn row_to_admin_sqlite(row: &SqliteRow) -> Result<AdminUser> {
    admin_from_row!(row)
}

fn row_to_admin_mysql(row: &MySqlRow) -> Result<AdminUser> {
    admin_from_row!(row)
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn count_sqlite(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_users")
        .fetch_one(pool)
        .await
        .context("Failed to count admins")?;
    Ok(count)
}

async fn create_sqlite(pool: &SqlitePool, admin: &AdminUser) -> Result<AdminUser> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_ADMIN)
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(admin.role.as_str())
        .bind(admin.status.as_str())
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create admin")?;

    Ok(AdminUser {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..admin.clone()
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<AdminUser>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_ADMIN))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get admin by ID")?;

    row.as_ref().map(row_to_admin_sqlite).transpose()
}

async fn get_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<AdminUser>> {
    let row = sqlx::query(&format!("{} WHERE email = ?", SELECT_ADMIN))
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get admin by email")?;

    row.as_ref().map(row_to_admin_sqlite).transpose()
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn count_mysql(pool: &MySqlPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_users")
        .fetch_one(pool)
        .await
        .context("Failed to count admins")?;
    Ok(count)
}

async fn create_mysql(pool: &MySqlPool, admin: &AdminUser) -> Result<AdminUser> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_ADMIN)
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(admin.role.as_str())
        .bind(admin.status.as_str())
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create admin")?;

    Ok(AdminUser {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..admin.clone()
    })
}

async fn get_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<AdminUser>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_ADMIN))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get admin by ID")?;

    row.as_ref().map(row_to_admin_mysql).transpose()
}

async fn get_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<AdminUser>> {
    let row = sqlx::query(&format!("{} WHERE email = ?", SELECT_ADMIN))
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get admin by email")?;

    row.as_ref().map(row_to_admin_mysql).transpose()
}
