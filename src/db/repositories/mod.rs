//! Database repositories
//!
//! One repository per entity. Each exposes a trait used by the services and
//! an `Sqlx*Repository` implementation that dispatches on the pool driver to
//! SQLite or MySQL specific functions.

pub mod ad;
pub mod admin;
pub mod bookmark;
pub mod category;
pub mod comment;
pub mod content;
pub mod link;
pub mod partner;
pub mod report;
pub mod session;
pub mod settings;
pub mod stats;

pub use ad::{AdRepository, SqlxAdRepository};
pub use admin::{AdminRepository, SqlxAdminRepository};
pub use bookmark::{BookmarkRepository, SqlxBookmarkRepository};
pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use content::{ContentRepository, SqlxContentRepository};
pub use link::{LinkRepository, SqlxLinkRepository};
pub use partner::{PartnerRepository, SqlxPartnerRepository};
pub use report::{ReportRepository, SqlxReportRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use settings::{SettingsRepository, SqlxSettingsRepository};
pub use stats::{SqlxStatsRepository, StatsRepository};

use anyhow::Result;
use std::str::FromStr;

/// Decode an enum stored as text
pub(crate) fn parse_enum<T>(raw: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>().map_err(anyhow::Error::msg)
}

/// `?, ?, ?` for an `IN (...)` clause with `count` values
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixtures shared by the repository tests

    use crate::db::{create_test_pool, migrations::run_migrations, DynDatabasePool};
    use crate::models::{Content, ContentStatus, ContentType};
    use chrono::Utc;

    use super::{ContentRepository, SqlxContentRepository};

    pub async fn migrated_pool() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    pub fn new_content(title: &str, slug: &str, content_type: ContentType) -> Content {
        let now = Utc::now();
        Content {
            id: 0,
            title: title.to_string(),
            slug: slug.to_string(),
            content_type,
            image_url: format!("https://img.example/{}.jpg", slug),
            description: None,
            external_url: format!("https://source.example/{}", slug),
            status: ContentStatus::Published,
            direct_redirect: false,
            tags: None,
            rating: None,
            views_total: 0,
            clicks_total: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub async fn insert_content(pool: &DynDatabasePool, slug: &str) -> Content {
        SqlxContentRepository::new(pool.clone())
            .create(&new_content(slug, slug, ContentType::Manga))
            .await
            .expect("Failed to create content")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinkType;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn test_parse_enum() {
        assert_eq!(parse_enum::<LinkType>("WATCH").unwrap(), LinkType::Watch);
        assert!(parse_enum::<LinkType>("STREAM").is_err());
    }
}
