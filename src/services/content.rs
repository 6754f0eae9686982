//! Content service
//!
//! Implements the catalog:
//! - public listing with type, category and search filters
//! - public detail with links and suggestions (records a view)
//! - admin CRUD with category assignment and nested link creation

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::{generate_slug, optional_text, required_text, unique_slug, AnalyticsService};
use crate::db::repositories::link::new_link;
use crate::db::repositories::{ContentRepository, LinkRepository};
use crate::models::{
    AdminContent, Category, Content, ContentDetail, ContentLink, ContentWithCategories,
    CreateContentInput, PagedContent, PublicContentQuery, SuggestedContent, UpdateContentInput,
};

/// Number of items in the "suggested" strip
const SUGGESTED_LIMIT: i64 = 6;

#[derive(Debug, Error)]
pub enum ContentServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Content not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Content service
pub struct ContentService {
    repo: Arc<dyn ContentRepository>,
    links: Arc<dyn LinkRepository>,
    analytics: Arc<AnalyticsService>,
}

impl ContentService {
    pub fn new(
        repo: Arc<dyn ContentRepository>,
        links: Arc<dyn LinkRepository>,
        analytics: Arc<AnalyticsService>,
    ) -> Self {
        Self {
            repo,
            links,
            analytics,
        }
    }

    /// One page of published content of a type, with categories
    pub async fn list_public(&self, query: &PublicContentQuery) -> Result<PagedContent, ContentServiceError> {
        let (contents, total) = self.repo.list_public(query).await?;
        let items = self.with_categories(contents).await?;

        Ok(PagedContent {
            items,
            total,
            page: query.page,
            page_size: query.page_size,
        })
    }

    /// Public detail page data. Counts a view for the item.
    pub async fn get_public_detail(&self, slug: &str) -> Result<ContentDetail, ContentServiceError> {
        let content = self
            .repo
            .get_by_slug(slug)
            .await?
            .filter(Content::is_published)
            .ok_or(ContentServiceError::NotFound)?;

        if let Err(e) = self.analytics.increment_content_view(content.id).await {
            tracing::warn!("Failed to record view for content {}: {}", content.id, e);
        }

        let categories: Vec<Category> = self
            .repo
            .categories_for(&[content.id])
            .await?
            .into_iter()
            .map(|(_, category)| category)
            .collect();
        let category_ids: Vec<i64> = categories.iter().map(|c| c.id).collect();

        let links = self.links.all_for_content(content.id).await?;
        let suggested = self
            .repo
            .suggested(&content, &category_ids, SUGGESTED_LIMIT)
            .await?
            .into_iter()
            .map(|c| SuggestedContent {
                id: c.id,
                title: c.title,
                slug: c.slug,
                content_type: c.content_type,
                image_url: c.image_url,
                rating: c.rating,
            })
            .collect();

        Ok(ContentDetail {
            tag_list: content.tag_list(),
            content,
            categories,
            links,
            suggested,
        })
    }

    /// Every record, newest first, with categories and links
    pub async fn list_admin(&self) -> Result<Vec<AdminContent>, ContentServiceError> {
        let contents = self.repo.list_all().await?;
        self.to_admin_records(contents).await
    }

    pub async fn get_admin(&self, id: i64) -> Result<AdminContent, ContentServiceError> {
        let content = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(ContentServiceError::NotFound)?;
        let mut records = self.to_admin_records(vec![content]).await?;
        records.pop().ok_or(ContentServiceError::NotFound)
    }

    /// Create a record with its categories and links
    ///
    /// Unknown category ids are skipped.
    pub async fn create(&self, input: CreateContentInput) -> Result<AdminContent, ContentServiceError> {
        let title = required_text(input.title.as_deref());
        let image_url = required_text(input.image_url.as_deref());
        let external_url = required_text(input.external_url.as_deref());
        let (Some(title), Some(content_type), Some(image_url), Some(external_url)) =
            (title, input.content_type, image_url, external_url)
        else {
            return Err(ContentServiceError::Validation(
                "Title, type, imageUrl and externalUrl are required".to_string(),
            ));
        };

        let slug = self.free_slug(&title, None).await?;
        let now = Utc::now();
        let content = Content {
            id: 0,
            title,
            slug,
            content_type,
            image_url,
            description: optional_text(input.description),
            external_url,
            status: input.status.unwrap_or_default(),
            direct_redirect: input.direct_redirect.unwrap_or(false),
            tags: optional_text(input.tags),
            rating: input.rating,
            views_total: 0,
            clicks_total: 0,
            created_at: now,
            updated_at: now,
        };
        let created = self.repo.create(&content).await?;

        if let Some(category_ids) = input.category_ids.as_deref() {
            self.repo.add_categories(created.id, category_ids).await?;
        }
        for link in input.links.unwrap_or_default() {
            self.links
                .create(&new_link(
                    created.id,
                    link.url.trim(),
                    link.source_name.trim(),
                    link.link_type,
                    link.status,
                    link.priority,
                    None,
                ))
                .await?;
        }

        tracing::info!("Created content {} ({})", created.id, created.slug);
        self.get_admin(created.id).await
    }

    /// Partial update
    ///
    /// A title change regenerates the slug. `categoryIds`, when present,
    /// replace the current set.
    pub async fn update(&self, id: i64, input: UpdateContentInput) -> Result<AdminContent, ContentServiceError> {
        let mut content = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(ContentServiceError::NotFound)?;

        if let Some(raw) = input.title.as_deref() {
            let title = required_text(Some(raw))
                .ok_or_else(|| ContentServiceError::Validation("Title cannot be empty".to_string()))?;
            if title != content.title {
                content.slug = self.free_slug(&title, Some(id)).await?;
                content.title = title;
            }
        }
        if let Some(content_type) = input.content_type {
            content.content_type = content_type;
        }
        if let Some(raw) = input.image_url.as_deref() {
            content.image_url = required_text(Some(raw))
                .ok_or_else(|| ContentServiceError::Validation("imageUrl cannot be empty".to_string()))?;
        }
        if let Some(raw) = input.external_url.as_deref() {
            content.external_url = required_text(Some(raw)).ok_or_else(|| {
                ContentServiceError::Validation("externalUrl cannot be empty".to_string())
            })?;
        }
        if let Some(description) = input.description {
            content.description = optional_text(description);
        }
        if let Some(status) = input.status {
            content.status = status;
        }
        if let Some(direct_redirect) = input.direct_redirect {
            content.direct_redirect = direct_redirect;
        }
        if let Some(tags) = input.tags {
            content.tags = optional_text(tags);
        }
        if let Some(rating) = input.rating {
            content.rating = rating;
        }

        self.repo.update(&content).await?;
        if let Some(category_ids) = input.category_ids.as_deref() {
            self.repo.set_categories(id, category_ids).await?;
        }

        self.get_admin(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ContentServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ContentServiceError::NotFound);
        }
        tracing::info!("Deleted content {}", id);
        Ok(())
    }

    async fn free_slug(&self, title: &str, exclude_id: Option<i64>) -> anyhow::Result<String> {
        let repo = &self.repo;
        unique_slug(&generate_slug(title), |slug| async move {
            repo.slug_exists(&slug, exclude_id).await
        })
        .await
    }

    async fn with_categories(
        &self,
        contents: Vec<Content>,
    ) -> Result<Vec<ContentWithCategories>, ContentServiceError> {
        let ids: Vec<i64> = contents.iter().map(|c| c.id).collect();
        let mut categories = group_by_content(self.repo.categories_for(&ids).await?);

        Ok(contents
            .into_iter()
            .map(|content| ContentWithCategories {
                categories: categories.remove(&content.id).unwrap_or_default(),
                content,
            })
            .collect())
    }

    async fn to_admin_records(&self, contents: Vec<Content>) -> Result<Vec<AdminContent>, ContentServiceError> {
        let ids: Vec<i64> = contents.iter().map(|c| c.id).collect();
        let mut categories = group_by_content(self.repo.categories_for(&ids).await?);
        let mut links: HashMap<i64, Vec<ContentLink>> = HashMap::new();
        for link in self.links.links_for_contents(&ids).await? {
            links.entry(link.content_id).or_default().push(link);
        }

        Ok(contents
            .into_iter()
            .map(|content| AdminContent {
                categories: categories.remove(&content.id).unwrap_or_default(),
                links: links.remove(&content.id).unwrap_or_default(),
                content,
            })
            .collect())
    }
}

fn group_by_content(pairs: Vec<(i64, Category)>) -> HashMap<i64, Vec<Category>> {
    let mut grouped: HashMap<i64, Vec<Category>> = HashMap::new();
    for (content_id, category) in pairs {
        grouped.entry(content_id).or_default().push(category);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;
    use crate::db::repositories::{SqlxContentRepository, SqlxLinkRepository, SqlxStatsRepository};
    use crate::models::{ContentSort, ContentStatus, ContentType, LinkStatus, LinkType, NewLinkInput};

    async fn setup_test_service() -> ContentService {
        let pool = migrated_pool().await;
        let repo = SqlxContentRepository::boxed(pool.clone());
        let analytics = Arc::new(AnalyticsService::new(
            SqlxStatsRepository::boxed(pool.clone()),
            repo.clone(),
        ));
        ContentService::new(repo, SqlxLinkRepository::boxed(pool), analytics)
    }

    fn link(url: &str, status: LinkStatus, priority: i32) -> NewLinkInput {
        NewLinkInput {
            url: url.to_string(),
            source_name: "Mirror".to_string(),
            link_type: LinkType::Read,
            status,
            priority,
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let service = setup_test_service().await;
        let created = service
            .create(
                CreateContentInput::new("Blue Lock", ContentType::Manga, "img", "https://x")
                    .with_categories(vec![1, 1, 3, 999])
                    .with_links(vec![link("https://a", LinkStatus::Verified, 0)]),
            )
            .await
            .unwrap();

        assert_eq!(created.content.slug, "blue-lock");
        assert_eq!(created.content.status, ContentStatus::Published);
        assert!(!created.content.direct_redirect);
        let category_ids: Vec<i64> = created.categories.iter().map(|c| c.id).collect();
        assert_eq!(category_ids, vec![1, 3]);
        assert_eq!(created.links.len(), 1);
        assert_eq!(created.links[0].priority, 0);
    }

    #[tokio::test]
    async fn test_create_requires_fields() {
        let service = setup_test_service().await;
        let input = CreateContentInput {
            title: Some("No Type".to_string()),
            image_url: Some("img".to_string()),
            external_url: Some("https://x".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.create(input).await,
            Err(ContentServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_titles_get_counter_slugs() {
        let service = setup_test_service().await;
        let input = || CreateContentInput::new("Akira", ContentType::Movie, "img", "https://x");

        assert_eq!(service.create(input()).await.unwrap().content.slug, "akira");
        assert_eq!(service.create(input()).await.unwrap().content.slug, "akira-2");
        assert_eq!(service.create(input()).await.unwrap().content.slug, "akira-3");
    }

    #[tokio::test]
    async fn test_update_reslugs_and_replaces_categories() {
        let service = setup_test_service().await;
        let created = service
            .create(
                CreateContentInput::new("Mob Psycho", ContentType::Anime, "img", "https://x")
                    .with_categories(vec![1, 2]),
            )
            .await
            .unwrap();

        let same_title = service
            .update(
                created.content.id,
                UpdateContentInput {
                    title: Some("Mob Psycho".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same_title.content.slug, "mob-psycho");

        let updated = service
            .update(
                created.content.id,
                UpdateContentInput {
                    title: Some("Mob Psycho 100".to_string()),
                    category_ids: Some(vec![5]),
                    status: Some(ContentStatus::Draft),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.content.slug, "mob-psycho-100");
        assert_eq!(updated.content.status, ContentStatus::Draft);
        assert_eq!(updated.categories.len(), 1);
        assert_eq!(updated.categories[0].id, 5);
    }

    #[tokio::test]
    async fn test_public_detail_records_view_and_orders_links() {
        let service = setup_test_service().await;
        let created = service
            .create(
                CreateContentInput::new("Frieren", ContentType::Anime, "img", "https://x")
                    .with_categories(vec![4])
                    .with_links(vec![
                        link("https://blocked", LinkStatus::Blocked, 10),
                        link("https://low", LinkStatus::Verified, 1),
                        link("https://high", LinkStatus::Verified, 5),
                        link("https://pending", LinkStatus::Unverified, 7),
                    ]),
            )
            .await
            .unwrap();
        service
            .create(
                CreateContentInput::new("Dungeon Meshi", ContentType::Anime, "img", "https://y"),
            )
            .await
            .unwrap();

        let detail = service.get_public_detail("frieren").await.unwrap();
        let urls: Vec<&str> = detail.links.iter().map(|l| l.link.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://high", "https://low", "https://pending", "https://blocked"]
        );
        assert_eq!(detail.categories[0].slug, "fantasy");
        assert_eq!(detail.suggested.len(), 1);
        assert_eq!(detail.suggested[0].slug, "dungeon-meshi");

        let stored = service.get_admin(created.content.id).await.unwrap();
        assert_eq!(stored.content.views_total, 1);
    }

    #[tokio::test]
    async fn test_public_detail_hides_unpublished() {
        let service = setup_test_service().await;
        service
            .create(
                CreateContentInput::new("Draft Item", ContentType::Movie, "img", "https://x")
                    .with_status(ContentStatus::Draft),
            )
            .await
            .unwrap();

        assert!(matches!(
            service.get_public_detail("draft-item").await,
            Err(ContentServiceError::NotFound)
        ));
        assert!(matches!(
            service.get_public_detail("missing").await,
            Err(ContentServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_public_attaches_categories() {
        let service = setup_test_service().await;
        for (title, categories) in [("Zeta", vec![1]), ("Alpha", vec![1, 2]), ("Mu", vec![])] {
            service
                .create(
                    CreateContentInput::new(title, ContentType::Manga, "img", "https://x")
                        .with_categories(categories),
                )
                .await
                .unwrap();
        }

        let page = service
            .list_public(&PublicContentQuery::new(ContentType::Manga).with_sort(ContentSort::Az))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 24);
        let titles: Vec<&str> = page.items.iter().map(|i| i.content.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Mu", "Zeta"]);
        assert_eq!(page.items[0].categories.len(), 2);
        assert!(page.items[1].categories.is_empty());

        let action = service
            .list_public(&PublicContentQuery::new(ContentType::Manga).with_category("action"))
            .await
            .unwrap();
        assert_eq!(action.total, 2);
    }

    #[tokio::test]
    async fn test_delete() {
        let service = setup_test_service().await;
        let created = service
            .create(CreateContentInput::new("Gone", ContentType::Movie, "img", "https://x"))
            .await
            .unwrap();

        service.delete(created.content.id).await.unwrap();
        assert!(matches!(
            service.get_admin(created.content.id).await,
            Err(ContentServiceError::NotFound)
        ));
        assert!(matches!(
            service.delete(created.content.id).await,
            Err(ContentServiceError::NotFound)
        ));
    }
}
