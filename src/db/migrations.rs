//! Database migrations module
//!
//! Code-based migrations for the Bookmark schema. Every migration carries SQL
//! for SQLite and for MySQL and is embedded in the binary.
//!
//! # Usage
//!
//! ```ignore
//! use bookmark::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```
//!
//! Timestamps are always bound from application code, so `DEFAULT` clauses on
//! time columns only matter for rows inserted by hand.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{MySqlPool, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_admin_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS admin_users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'EDITOR',
                status VARCHAR(20) NOT NULL DEFAULT 'ACTIVE',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS admin_users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'EDITOR',
                status VARCHAR(20) NOT NULL DEFAULT 'ACTIVE',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_admin_sessions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS admin_sessions (
                id VARCHAR(64) PRIMARY KEY,
                admin_id INTEGER NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (admin_id) REFERENCES admin_users(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_admin_sessions_admin_id ON admin_sessions(admin_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS admin_sessions (
                id VARCHAR(64) PRIMARY KEY,
                admin_id BIGINT NOT NULL,
                expires_at TIMESTAMP NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (admin_id) REFERENCES admin_users(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_admin_sessions_admin_id ON admin_sessions(admin_id);
        "#,
    },
    Migration {
        version: 3,
        name: "create_contents",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS contents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                content_type VARCHAR(10) NOT NULL,
                image_url TEXT NOT NULL,
                description TEXT,
                external_url TEXT NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'PUBLISHED',
                direct_redirect BOOLEAN NOT NULL DEFAULT 0,
                tags TEXT,
                rating REAL,
                views_total INTEGER NOT NULL DEFAULT 0,
                clicks_total INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_contents_type_status ON contents(content_type, status);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS contents (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                content_type VARCHAR(10) NOT NULL,
                image_url TEXT NOT NULL,
                description TEXT,
                external_url TEXT NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'PUBLISHED',
                direct_redirect BOOLEAN NOT NULL DEFAULT FALSE,
                tags TEXT,
                rating DOUBLE,
                views_total BIGINT NOT NULL DEFAULT 0,
                clicks_total BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_contents_type_status ON contents(content_type, status);
        "#,
    },
    Migration {
        version: 4,
        name: "create_categories",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                slug VARCHAR(120) NOT NULL UNIQUE,
                type_scope VARCHAR(20) NOT NULL DEFAULT 'UNIVERSAL',
                sort_order INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS categories (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(100) NOT NULL,
                slug VARCHAR(120) NOT NULL UNIQUE,
                type_scope VARCHAR(20) NOT NULL DEFAULT 'UNIVERSAL',
                sort_order INT NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 5,
        name: "create_content_categories",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS content_categories (
                content_id INTEGER NOT NULL,
                category_id INTEGER NOT NULL,
                PRIMARY KEY (content_id, category_id),
                FOREIGN KEY (content_id) REFERENCES contents(id) ON DELETE CASCADE,
                FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_content_categories_category ON content_categories(category_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS content_categories (
                content_id BIGINT NOT NULL,
                category_id BIGINT NOT NULL,
                PRIMARY KEY (content_id, category_id),
                FOREIGN KEY (content_id) REFERENCES contents(id) ON DELETE CASCADE,
                FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_content_categories_category ON content_categories(category_id);
        "#,
    },
    Migration {
        version: 6,
        name: "create_partners",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS partners (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(150) NOT NULL,
                slug VARCHAR(170) NOT NULL UNIQUE,
                website_url TEXT NOT NULL,
                logo_url TEXT,
                is_verified BOOLEAN NOT NULL DEFAULT 0,
                priority_score INTEGER NOT NULL DEFAULT 0,
                description TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS partners (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                name VARCHAR(150) NOT NULL,
                slug VARCHAR(170) NOT NULL UNIQUE,
                website_url TEXT NOT NULL,
                logo_url TEXT,
                is_verified BOOLEAN NOT NULL DEFAULT FALSE,
                priority_score INT NOT NULL DEFAULT 0,
                description TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 7,
        name: "create_content_links",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS content_links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_id INTEGER NOT NULL,
                url TEXT NOT NULL,
                source_name VARCHAR(150) NOT NULL,
                link_type VARCHAR(20) NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'UNVERIFIED',
                priority INTEGER NOT NULL DEFAULT 0,
                partner_id INTEGER,
                click_count INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (content_id) REFERENCES contents(id) ON DELETE CASCADE,
                FOREIGN KEY (partner_id) REFERENCES partners(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_content_links_content ON content_links(content_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS content_links (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                content_id BIGINT NOT NULL,
                url TEXT NOT NULL,
                source_name VARCHAR(150) NOT NULL,
                link_type VARCHAR(20) NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'UNVERIFIED',
                priority INT NOT NULL DEFAULT 0,
                partner_id BIGINT,
                click_count BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (content_id) REFERENCES contents(id) ON DELETE CASCADE,
                FOREIGN KEY (partner_id) REFERENCES partners(id) ON DELETE SET NULL
            );
            CREATE INDEX idx_content_links_content ON content_links(content_id);
        "#,
    },
    Migration {
        version: 8,
        name: "create_link_clicks",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS link_clicks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                link_id INTEGER NOT NULL,
                content_id INTEGER NOT NULL,
                user_agent TEXT,
                ip_address VARCHAR(64),
                referrer TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (link_id) REFERENCES content_links(id) ON DELETE CASCADE,
                FOREIGN KEY (content_id) REFERENCES contents(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_link_clicks_link ON link_clicks(link_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS link_clicks (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                link_id BIGINT NOT NULL,
                content_id BIGINT NOT NULL,
                user_agent TEXT,
                ip_address VARCHAR(64),
                referrer TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (link_id) REFERENCES content_links(id) ON DELETE CASCADE,
                FOREIGN KEY (content_id) REFERENCES contents(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_link_clicks_link ON link_clicks(link_id);
        "#,
    },
    Migration {
        version: 9,
        name: "create_ads",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS ads (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                position VARCHAR(50) NOT NULL,
                ad_type VARCHAR(10) NOT NULL,
                image_url TEXT,
                script_code TEXT,
                target_url TEXT,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                start_date TIMESTAMP,
                end_date TIMESTAMP,
                sort_order INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_ads_position ON ads(position);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS ads (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                position VARCHAR(50) NOT NULL,
                ad_type VARCHAR(10) NOT NULL,
                image_url TEXT,
                script_code TEXT,
                target_url TEXT,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                start_date TIMESTAMP NULL,
                end_date TIMESTAMP NULL,
                sort_order INT NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_ads_position ON ads(position);
        "#,
    },
    Migration {
        version: 10,
        name: "create_content_reports",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS content_reports (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_id INTEGER NOT NULL,
                reason VARCHAR(255) NOT NULL,
                details TEXT,
                reporter_ip VARCHAR(64),
                status VARCHAR(20) NOT NULL DEFAULT 'PENDING',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (content_id) REFERENCES contents(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_content_reports_status ON content_reports(status);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS content_reports (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                content_id BIGINT NOT NULL,
                reason VARCHAR(255) NOT NULL,
                details TEXT,
                reporter_ip VARCHAR(64),
                status VARCHAR(20) NOT NULL DEFAULT 'PENDING',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (content_id) REFERENCES contents(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_content_reports_status ON content_reports(status);
        "#,
    },
    Migration {
        version: 11,
        name: "create_comments",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_id INTEGER NOT NULL,
                parent_id INTEGER,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL,
                body TEXT NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'PENDING',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (content_id) REFERENCES contents(id) ON DELETE CASCADE,
                FOREIGN KEY (parent_id) REFERENCES comments(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_comments_content ON comments(content_id);
            CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS comments (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                content_id BIGINT NOT NULL,
                parent_id BIGINT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL,
                body TEXT NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'PENDING',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (content_id) REFERENCES contents(id) ON DELETE CASCADE,
                FOREIGN KEY (parent_id) REFERENCES comments(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_comments_content ON comments(content_id);
            CREATE INDEX idx_comments_parent ON comments(parent_id);
        "#,
    },
    Migration {
        version: 12,
        name: "create_content_stats",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS content_stats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content_id INTEGER NOT NULL,
                date VARCHAR(10) NOT NULL,
                views INTEGER NOT NULL DEFAULT 0,
                clicks INTEGER NOT NULL DEFAULT 0,
                UNIQUE (content_id, date),
                FOREIGN KEY (content_id) REFERENCES contents(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_content_stats_date ON content_stats(date);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS content_stats (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                content_id BIGINT NOT NULL,
                date VARCHAR(10) NOT NULL,
                views BIGINT NOT NULL DEFAULT 0,
                clicks BIGINT NOT NULL DEFAULT 0,
                UNIQUE KEY uq_content_stats_day (content_id, date),
                FOREIGN KEY (content_id) REFERENCES contents(id) ON DELETE CASCADE
            );
            CREATE INDEX idx_content_stats_date ON content_stats(date);
        "#,
    },
    Migration {
        version: 13,
        name: "create_site_settings",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS site_settings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                site_name VARCHAR(100) NOT NULL DEFAULT 'Bookmark',
                logo_url TEXT,
                google_analytics_id VARCHAR(50),
                header_ad_html TEXT,
                footer_ad_html TEXT,
                banner_title TEXT,
                banner_subtitle TEXT,
                banner_description TEXT,
                banner_bg_color VARCHAR(50),
                banner_bg_image TEXT,
                banner_text_color VARCHAR(50),
                banner_btn1_text VARCHAR(100),
                banner_btn1_link TEXT,
                banner_btn1_color VARCHAR(50),
                banner_btn2_text VARCHAR(100),
                banner_btn2_link TEXT,
                banner_btn2_color VARCHAR(50),
                header_bg_color VARCHAR(50),
                header_text_color VARCHAR(50),
                footer_bg_color VARCHAR(50),
                footer_text_color VARCHAR(50),
                footer_description TEXT,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS site_settings (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                site_name VARCHAR(100) NOT NULL DEFAULT 'Bookmark',
                logo_url TEXT,
                google_analytics_id VARCHAR(50),
                header_ad_html TEXT,
                footer_ad_html TEXT,
                banner_title TEXT,
                banner_subtitle TEXT,
                banner_description TEXT,
                banner_bg_color VARCHAR(50),
                banner_bg_image TEXT,
                banner_text_color VARCHAR(50),
                banner_btn1_text VARCHAR(100),
                banner_btn1_link TEXT,
                banner_btn1_color VARCHAR(50),
                banner_btn2_text VARCHAR(100),
                banner_btn2_link TEXT,
                banner_btn2_color VARCHAR(50),
                header_bg_color VARCHAR(50),
                header_text_color VARCHAR(50),
                footer_bg_color VARCHAR(50),
                footer_text_color VARCHAR(50),
                footer_description TEXT,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 14,
        name: "create_bookmarks",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS bookmarks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id VARCHAR(128) NOT NULL,
                content_id INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (user_id, content_id),
                FOREIGN KEY (content_id) REFERENCES contents(id) ON DELETE CASCADE
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS bookmarks (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                user_id VARCHAR(128) NOT NULL,
                content_id BIGINT NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE KEY uq_bookmarks_user_content (user_id, content_id),
                FOREIGN KEY (content_id) REFERENCES contents(id) ON DELETE CASCADE
            );
        "#,
    },
    Migration {
        version: 15,
        name: "seed_default_categories",
        up_sqlite: r#"
            INSERT OR IGNORE INTO categories (name, slug, type_scope, sort_order) VALUES
                ('Action', 'action', 'UNIVERSAL', 1),
                ('Romance', 'romance', 'UNIVERSAL', 2),
                ('Comedy', 'comedy', 'UNIVERSAL', 3),
                ('Fantasy', 'fantasy', 'UNIVERSAL', 4),
                ('Horror', 'horror', 'UNIVERSAL', 5),
                ('Sci-Fi', 'sci-fi', 'UNIVERSAL', 6),
                ('Slice of Life', 'slice-of-life', 'UNIVERSAL', 7),
                ('Drama', 'drama', 'UNIVERSAL', 8);
        "#,
        up_mysql: r#"
            INSERT IGNORE INTO categories (name, slug, type_scope, sort_order) VALUES
                ('Action', 'action', 'UNIVERSAL', 1),
                ('Romance', 'romance', 'UNIVERSAL', 2),
                ('Comedy', 'comedy', 'UNIVERSAL', 3),
                ('Fantasy', 'fantasy', 'UNIVERSAL', 4),
                ('Horror', 'horror', 'UNIVERSAL', 5),
                ('Sci-Fi', 'sci-fi', 'UNIVERSAL', 6),
                ('Slice of Life', 'slice-of-life', 'UNIVERSAL', 7),
                ('Drama', 'drama', 'UNIVERSAL', 8);
        "#,
    },
];

/// Apply every migration not yet recorded in `_migrations`, in order
///
/// Returns the number applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    let pending = pending_migrations(pool).await?;

    for migration in &pending {
        tracing::info!("Applying migration {}: {}", migration.version, migration.name);
        apply_migration(pool, migration)
            .await
            .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
    }

    if pending.is_empty() {
        tracing::debug!("No pending migrations");
    }
    Ok(pending.len())
}

pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    Ok(pending_migrations(pool).await?.len())
}

async fn pending_migrations(pool: &DynDatabasePool) -> Result<Vec<&'static Migration>> {
    create_migrations_table(pool).await?;
    let applied = applied_versions(pool).await?;
    Ok(MIGRATIONS
        .iter()
        .filter(|m| !applied.contains(&i64::from(m.version)))
        .collect())
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let version_type = match pool.driver() {
        DatabaseDriver::Sqlite => "INTEGER",
        DatabaseDriver::Mysql => "BIGINT",
    };
    pool.execute(&format!(
        "CREATE TABLE IF NOT EXISTS _migrations (\
            version {} PRIMARY KEY, \
            name VARCHAR(255) NOT NULL UNIQUE, \
            applied_at TIMESTAMP NOT NULL)",
        version_type
    ))
    .await?;
    Ok(())
}

const APPLIED_VERSIONS_SQL: &str = "SELECT version FROM _migrations ORDER BY version";
const RECORD_MIGRATION_SQL: &str = "INSERT INTO _migrations (version, name, applied_at) VALUES (?, ?, ?)";

async fn applied_versions(pool: &DynDatabasePool) -> Result<Vec<i64>> {
    let versions = match pool.driver() {
        DatabaseDriver::Sqlite => applied_versions_sqlite(pool.as_sqlite().unwrap()).await,
        DatabaseDriver::Mysql => applied_versions_mysql(pool.as_mysql().unwrap()).await,
    };
    versions.context("Failed to read applied migrations")
}

async fn applied_versions_sqlite(pool: &SqlitePool) -> sqlx::Result<Vec<i64>> {
    sqlx::query_scalar(APPLIED_VERSIONS_SQL).fetch_all(pool).await
}

async fn applied_versions_mysql(pool: &MySqlPool) -> sqlx::Result<Vec<i64>> {
    sqlx::query_scalar(APPLIED_VERSIONS_SQL).fetch_all(pool).await
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => migration.up_sqlite,
        DatabaseDriver::Mysql => migration.up_mysql,
    };

    for statement in split_sql_statements(sql) {
        pool.execute(statement)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    let recorded = match pool.driver() {
        DatabaseDriver::Sqlite => {
            sqlx::query(RECORD_MIGRATION_SQL)
                .bind(i64::from(migration.version))
                .bind(migration.name)
                .bind(Utc::now())
                .execute(pool.as_sqlite().unwrap())
                .await
                .map(|_| ())
        }
        DatabaseDriver::Mysql => {
            sqlx::query(RECORD_MIGRATION_SQL)
                .bind(i64::from(migration.version))
                .bind(migration.name)
                .bind(Utc::now())
                .execute(pool.as_mysql().unwrap())
                .await
                .map(|_| ())
        }
    };
    recorded.context("Failed to record migration")
}

/// First 100 characters, for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Statements of a migration body, without comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use sqlx::Row;

    async fn migrated_pool() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    async fn insert_content(pool: &SqlitePool, slug: &str) -> i64 {
        sqlx::query(
            "INSERT INTO contents (title, slug, content_type, image_url, external_url) VALUES (?, ?, 'MANGA', 'img', 'ext')",
        )
        .bind(slug)
        .bind(slug)
        .execute(pool)
        .await
        .expect("Failed to insert content")
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, MIGRATIONS.len());

        let count = run_migrations(&pool).await.expect("Failed to run migrations");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_is_up_to_date_and_pending_count() {
        let pool = create_test_pool().await.expect("Failed to create test pool");

        assert!(!is_up_to_date(&pool).await.unwrap());
        assert_eq!(pending_count(&pool).await.unwrap(), MIGRATIONS.len());

        run_migrations(&pool).await.expect("Failed to run migrations");

        assert!(is_up_to_date(&pool).await.unwrap());
        assert_eq!(pending_count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_all_tables_created() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.as_sqlite().unwrap();

        for table in [
            "admin_users",
            "admin_sessions",
            "contents",
            "categories",
            "content_categories",
            "partners",
            "content_links",
            "link_clicks",
            "ads",
            "content_reports",
            "comments",
            "content_stats",
            "site_settings",
            "bookmarks",
        ] {
            let found: Option<String> =
                sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                    .bind(table)
                    .fetch_optional(sqlite_pool)
                    .await
                    .expect("Failed to query sqlite_master");
            assert_eq!(found.as_deref(), Some(table), "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_default_categories_seeded() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.as_sqlite().unwrap();

        let slugs: Vec<String> =
            sqlx::query_scalar("SELECT slug FROM categories ORDER BY sort_order")
                .fetch_all(sqlite_pool)
                .await
                .expect("Failed to query categories");

        assert_eq!(
            slugs,
            vec![
                "action",
                "romance",
                "comedy",
                "fantasy",
                "horror",
                "sci-fi",
                "slice-of-life",
                "drama"
            ]
        );
    }

    #[tokio::test]
    async fn test_content_defaults() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.as_sqlite().unwrap();
        let id = insert_content(sqlite_pool, "one-piece").await;

        let row = sqlx::query(
            "SELECT status, direct_redirect, views_total, clicks_total FROM contents WHERE id = ?",
        )
        .bind(id)
        .fetch_one(sqlite_pool)
        .await
        .expect("Failed to read content");

        assert_eq!(row.get::<String, _>("status"), "PUBLISHED");
        assert!(!row.get::<bool, _>("direct_redirect"));
        assert_eq!(row.get::<i64, _>("views_total"), 0);
        assert_eq!(row.get::<i64, _>("clicks_total"), 0);
    }

    #[tokio::test]
    async fn test_unique_constraints() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.as_sqlite().unwrap();

        let id = insert_content(sqlite_pool, "naruto").await;
        let duplicate = sqlx::query(
            "INSERT INTO contents (title, slug, content_type, image_url, external_url) VALUES ('x', 'naruto', 'ANIME', 'i', 'e')",
        )
        .execute(sqlite_pool)
        .await;
        assert!(duplicate.is_err());

        sqlx::query("INSERT INTO content_stats (content_id, date) VALUES (?, '2024-05-01')")
            .bind(id)
            .execute(sqlite_pool)
            .await
            .expect("Failed to insert stats");
        let duplicate_day =
            sqlx::query("INSERT INTO content_stats (content_id, date) VALUES (?, '2024-05-01')")
                .bind(id)
                .execute(sqlite_pool)
                .await;
        assert!(duplicate_day.is_err());

        sqlx::query("INSERT INTO bookmarks (user_id, content_id) VALUES ('u1', ?)")
            .bind(id)
            .execute(sqlite_pool)
            .await
            .expect("Failed to insert bookmark");
        let duplicate_bookmark =
            sqlx::query("INSERT INTO bookmarks (user_id, content_id) VALUES ('u1', ?)")
                .bind(id)
                .execute(sqlite_pool)
                .await;
        assert!(duplicate_bookmark.is_err());
    }

    #[tokio::test]
    async fn test_foreign_keys_cascade() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.as_sqlite().unwrap();

        let orphan = sqlx::query(
            "INSERT INTO content_links (content_id, url, source_name, link_type) VALUES (999, 'u', 's', 'READ')",
        )
        .execute(sqlite_pool)
        .await;
        assert!(orphan.is_err());

        let id = insert_content(sqlite_pool, "bleach").await;
        sqlx::query(
            "INSERT INTO content_links (content_id, url, source_name, link_type) VALUES (?, 'u', 's', 'READ')",
        )
        .bind(id)
        .execute(sqlite_pool)
        .await
        .expect("Failed to insert link");
        sqlx::query("INSERT INTO content_categories (content_id, category_id) VALUES (?, 1)")
            .bind(id)
            .execute(sqlite_pool)
            .await
            .expect("Failed to insert join row");

        sqlx::query("DELETE FROM contents WHERE id = ?")
            .bind(id)
            .execute(sqlite_pool)
            .await
            .expect("Failed to delete content");

        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content_links")
            .fetch_one(sqlite_pool)
            .await
            .unwrap();
        let joins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content_categories")
            .fetch_one(sqlite_pool)
            .await
            .unwrap();
        assert_eq!(links, 0);
        assert_eq!(joins, 0);
    }

    #[test]
    fn test_migration_versions_are_sequential() {
        for (index, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, index + 1);
        }
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT); CREATE TABLE b (id INT);";
        assert_eq!(split_sql_statements(sql).len(), 2);

        let sql_with_comments = "-- Comment\nCREATE TABLE a (id INT);\n-- trailing";
        assert_eq!(split_sql_statements(sql_with_comments).len(), 1);
    }

    #[test]
    fn test_truncate_sql() {
        let long = "x".repeat(150);
        assert_eq!(truncate_sql(&long).len(), 103);
        assert_eq!(truncate_sql("SELECT 1"), "SELECT 1");
    }
}
