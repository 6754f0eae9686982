//! Redirect service
//!
//! Outbound traffic goes through `/go` and `/redirect` so clicks can be
//! counted before the visitor leaves.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

use super::{AdService, AnalyticsService, SettingsService};
use crate::db::repositories::{ContentRepository, LinkRepository};
use crate::models::{Content, LinkWithPartner, NewLinkClick};
use crate::pages::{InterstitialPage, PageRenderer};

/// Ad position rendered on the interstitial
const AD_POSITION: &str = "redirect_page";

#[derive(Debug, Error)]
pub enum RedirectServiceError {
    #[error("Content not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Where to send the visitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// Plain redirect to this location
    Redirect(String),
    /// Interstitial HTML page that forwards after a countdown
    Interstitial(String),
}

/// Redirect service
pub struct RedirectService {
    contents: Arc<dyn ContentRepository>,
    links: Arc<dyn LinkRepository>,
    analytics: Arc<AnalyticsService>,
    ads: Arc<AdService>,
    settings: Arc<SettingsService>,
    pages: Arc<PageRenderer>,
}

impl RedirectService {
    pub fn new(
        contents: Arc<dyn ContentRepository>,
        links: Arc<dyn LinkRepository>,
        analytics: Arc<AnalyticsService>,
        ads: Arc<AdService>,
        settings: Arc<SettingsService>,
        pages: Arc<PageRenderer>,
    ) -> Self {
        Self {
            contents,
            links,
            analytics,
            ads,
            settings,
            pages,
        }
    }

    /// `/go/{slug}`: straight to the content's source
    ///
    /// Unknown or unpublished content sends the visitor home.
    pub async fn go(&self, slug: &str) -> Result<String, RedirectServiceError> {
        let Some(content) = self.published(slug).await? else {
            return Ok("/".to_string());
        };

        self.analytics.increment_content_click(content.id).await?;
        Ok(content.external_url)
    }

    /// `/redirect/{slug}` and `/redirect/{slug}/{link_id}`
    ///
    /// Without a link id the top verified link is used. A link that is
    /// missing, unverified or owned by other content falls back to the
    /// content page. Only clicks on an explicit link are logged per click.
    pub async fn redirect(
        &self,
        slug: &str,
        link_id: Option<i64>,
        click: NewLinkClick,
    ) -> Result<RedirectOutcome, RedirectServiceError> {
        let content = self
            .published(slug)
            .await?
            .ok_or(RedirectServiceError::NotFound)?;
        let fallback = RedirectOutcome::Redirect(format!("/content/{}", content.slug));

        let target = match link_id {
            None => self.links.top_verified(content.id).await?,
            Some(link_id) => self
                .links
                .verified_for_content(content.id)
                .await?
                .into_iter()
                .find(|entry| entry.link.id == link_id),
        };
        let Some(target) = target else {
            return Ok(fallback);
        };

        self.analytics.increment_content_click(content.id).await?;
        self.links.increment_click(target.link.id).await?;
        if link_id.is_some() {
            self.links.record_click(&target.link, &click).await?;
        }
        tracing::debug!("Redirecting {} via link {}", content.slug, target.link.id);

        if content.direct_redirect {
            return Ok(RedirectOutcome::Redirect(target.link.url));
        }
        Ok(RedirectOutcome::Interstitial(
            self.interstitial(&content, &target).await?,
        ))
    }

    async fn published(&self, slug: &str) -> Result<Option<Content>, RedirectServiceError> {
        Ok(self
            .contents
            .get_by_slug(slug)
            .await?
            .filter(Content::is_published))
    }

    async fn interstitial(
        &self,
        content: &Content,
        target: &LinkWithPartner,
    ) -> Result<String, RedirectServiceError> {
        // Ads and branding are decoration; the page still renders without them
        let ads = match self.ads.active_for_position(AD_POSITION, Utc::now()).await {
            Ok(ads) => ads,
            Err(e) => {
                tracing::warn!("Failed to load interstitial ads: {}", e);
                Vec::new()
            }
        };
        let site_name = match self.settings.get_or_create().await {
            Ok(settings) => settings.site_name,
            Err(e) => {
                tracing::warn!("Failed to load site settings: {}", e);
                crate::models::DEFAULT_SITE_NAME.to_string()
            }
        };

        Ok(self.pages.render_interstitial(&InterstitialPage {
            title: &content.title,
            target_url: &target.link.url,
            source_name: target.display_name(),
            site_name: &site_name,
            ads: &ads,
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::test_support::{migrated_pool, new_content};
    use crate::db::repositories::{
        SqlxAdRepository, SqlxContentRepository, SqlxLinkRepository, SqlxSettingsRepository,
        SqlxStatsRepository,
    };
    use crate::db::DynDatabasePool;
    use crate::models::{ContentLink, ContentStatus, ContentType, LinkStatus, LinkType};

    async fn setup() -> (DynDatabasePool, RedirectService) {
        let pool = migrated_pool().await;
        let cache = create_cache(&CacheConfig::default()).await.unwrap();
        let contents = SqlxContentRepository::boxed(pool.clone());
        let analytics = Arc::new(AnalyticsService::new(
            SqlxStatsRepository::boxed(pool.clone()),
            contents.clone(),
        ));
        let service = RedirectService::new(
            contents,
            SqlxLinkRepository::boxed(pool.clone()),
            analytics,
            Arc::new(AdService::new(SqlxAdRepository::boxed(pool.clone()))),
            Arc::new(SettingsService::new(SqlxSettingsRepository::boxed(pool.clone()), cache)),
            Arc::new(PageRenderer::new().unwrap()),
        );
        (pool, service)
    }

    async fn content(pool: &DynDatabasePool, slug: &str, direct: bool, status: ContentStatus) -> Content {
        let mut item = new_content(slug, slug, ContentType::Anime);
        item.direct_redirect = direct;
        item.status = status;
        SqlxContentRepository::new(pool.clone()).create(&item).await.unwrap()
    }

    async fn link(pool: &DynDatabasePool, content_id: i64, url: &str, status: LinkStatus, priority: i32) -> ContentLink {
        let now = Utc::now();
        SqlxLinkRepository::new(pool.clone())
            .create(&ContentLink {
                id: 0,
                content_id,
                url: url.to_string(),
                source_name: "Stream Site".to_string(),
                link_type: LinkType::Watch,
                status,
                priority,
                partner_id: None,
                click_count: 0,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
    }

    async fn totals(pool: &DynDatabasePool, content_id: i64) -> i64 {
        SqlxContentRepository::new(pool.clone())
            .get_by_id(content_id)
            .await
            .unwrap()
            .unwrap()
            .clicks_total
    }

    async fn logged_clicks(pool: &DynDatabasePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM link_clicks")
            .fetch_one(pool.as_sqlite().unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_go_redirects_and_counts() {
        let (pool, service) = setup().await;
        let item = content(&pool, "frieren", false, ContentStatus::Published).await;
        content(&pool, "hidden-gem", false, ContentStatus::Hidden).await;

        assert_eq!(service.go("frieren").await.unwrap(), item.external_url);
        assert_eq!(service.go("hidden-gem").await.unwrap(), "/");
        assert_eq!(service.go("nope").await.unwrap(), "/");
        assert_eq!(totals(&pool, item.id).await, 1);
    }

    #[tokio::test]
    async fn test_redirect_direct_uses_top_verified_link() {
        let (pool, service) = setup().await;
        let item = content(&pool, "dandadan", true, ContentStatus::Published).await;
        link(&pool, item.id, "https://low.example", LinkStatus::Verified, 1).await;
        let top = link(&pool, item.id, "https://top.example", LinkStatus::Verified, 9).await;
        link(&pool, item.id, "https://blocked.example", LinkStatus::Blocked, 50).await;

        let outcome = service
            .redirect("dandadan", None, NewLinkClick::default())
            .await
            .unwrap();
        assert_eq!(outcome, RedirectOutcome::Redirect("https://top.example".to_string()));
        assert_eq!(totals(&pool, item.id).await, 1);

        let stored = SqlxLinkRepository::new(pool.clone())
            .get_by_id(top.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.click_count, 1);
        assert_eq!(logged_clicks(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_redirect_specific_link_logs_click_and_renders_page() {
        let (pool, service) = setup().await;
        let item = content(&pool, "mob-psycho", false, ContentStatus::Published).await;
        let verified = link(&pool, item.id, "https://watch.example/mob", LinkStatus::Verified, 0).await;
        let pending = link(&pool, item.id, "https://pending.example", LinkStatus::Unverified, 0).await;

        let click = NewLinkClick {
            user_agent: Some("test-agent".to_string()),
            ip_address: Some("192.0.2.7".to_string()),
            referrer: None,
        };
        let outcome = service
            .redirect("mob-psycho", Some(verified.id), click)
            .await
            .unwrap();
        let RedirectOutcome::Interstitial(html) = outcome else {
            panic!("expected interstitial");
        };
        assert!(html.contains("Stream Site"));
        assert!(html.contains("Safe redirect powered by Bookmark"));
        assert_eq!(logged_clicks(&pool).await, 1);

        let fallback = service
            .redirect("mob-psycho", Some(pending.id), NewLinkClick::default())
            .await
            .unwrap();
        assert_eq!(fallback, RedirectOutcome::Redirect("/content/mob-psycho".to_string()));
        assert_eq!(totals(&pool, item.id).await, 1);
    }

    #[tokio::test]
    async fn test_redirect_without_links_or_content() {
        let (pool, service) = setup().await;
        content(&pool, "bare", false, ContentStatus::Published).await;
        content(&pool, "draft", false, ContentStatus::Draft).await;

        assert_eq!(
            service.redirect("bare", None, NewLinkClick::default()).await.unwrap(),
            RedirectOutcome::Redirect("/content/bare".to_string())
        );
        assert!(matches!(
            service.redirect("draft", None, NewLinkClick::default()).await,
            Err(RedirectServiceError::NotFound)
        ));
    }
}
