//! Link service
//!
//! Admin management of content source links and the public list of
//! verified links.

use std::sync::Arc;
use thiserror::Error;

use super::required_text;
use crate::db::repositories::link::new_link;
use crate::db::repositories::{ContentRepository, LinkRepository, PartnerRepository};
use crate::models::{AdminLink, ContentLink, CreateLinkInput, LinkWithPartner, UpdateLinkInput};

#[derive(Debug, Error)]
pub enum LinkServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LinkServiceError {
    fn link_not_found() -> Self {
        Self::NotFound("Link not found".to_string())
    }

    fn content_not_found() -> Self {
        Self::NotFound("Content not found".to_string())
    }
}

/// Link service
pub struct LinkService {
    repo: Arc<dyn LinkRepository>,
    contents: Arc<dyn ContentRepository>,
    partners: Arc<dyn PartnerRepository>,
}

impl LinkService {
    pub fn new(
        repo: Arc<dyn LinkRepository>,
        contents: Arc<dyn ContentRepository>,
        partners: Arc<dyn PartnerRepository>,
    ) -> Self {
        Self {
            repo,
            contents,
            partners,
        }
    }

    pub async fn list(&self, content_id: Option<i64>) -> Result<Vec<AdminLink>, LinkServiceError> {
        Ok(self.repo.list(content_id).await?)
    }

    pub async fn get(&self, id: i64) -> Result<ContentLink, LinkServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(LinkServiceError::link_not_found)
    }

    pub async fn create(&self, input: CreateLinkInput) -> Result<ContentLink, LinkServiceError> {
        let url = required_text(input.url.as_deref());
        let source_name = required_text(input.source_name.as_deref());
        let (Some(content_id), Some(url), Some(source_name), Some(link_type)) =
            (input.content_id, url, source_name, input.link_type)
        else {
            return Err(LinkServiceError::Validation("Missing required fields".to_string()));
        };

        if self.contents.get_by_id(content_id).await?.is_none() {
            return Err(LinkServiceError::content_not_found());
        }
        self.ensure_partner(input.partner_id).await?;

        let link = new_link(
            content_id,
            url,
            source_name,
            link_type,
            input.status.unwrap_or_default(),
            input.priority.unwrap_or(0),
            input.partner_id,
        );
        Ok(self.repo.create(&link).await?)
    }

    pub async fn update(&self, id: i64, input: UpdateLinkInput) -> Result<ContentLink, LinkServiceError> {
        let mut link = self.get(id).await?;

        if let Some(raw) = input.url.as_deref() {
            link.url = required_text(Some(raw))
                .ok_or_else(|| LinkServiceError::Validation("url cannot be empty".to_string()))?;
        }
        if let Some(raw) = input.source_name.as_deref() {
            link.source_name = required_text(Some(raw))
                .ok_or_else(|| LinkServiceError::Validation("sourceName cannot be empty".to_string()))?;
        }
        if let Some(link_type) = input.link_type {
            link.link_type = link_type;
        }
        if let Some(status) = input.status {
            link.status = status;
        }
        if let Some(priority) = input.priority {
            link.priority = priority;
        }
        if let Some(partner_id) = input.partner_id {
            self.ensure_partner(partner_id).await?;
            link.partner_id = partner_id;
        }

        Ok(self.repo.update(&link).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), LinkServiceError> {
        if !self.repo.delete(id).await? {
            return Err(LinkServiceError::link_not_found());
        }
        Ok(())
    }

    /// Verified links of a content item, addressed by id or slug.
    /// A given slug must exist even when `content_id` is also given, and the
    /// id then takes precedence.
    pub async fn verified_links(
        &self,
        content_id: Option<i64>,
        slug: Option<&str>,
    ) -> Result<Vec<LinkWithPartner>, LinkServiceError> {
        let slug_content_id = match slug.filter(|s| !s.is_empty()) {
            Some(slug) => Some(
                self.contents
                    .get_by_slug(slug)
                    .await?
                    .ok_or_else(LinkServiceError::content_not_found)?
                    .id,
            ),
            None => None,
        };
        let content_id = content_id.or(slug_content_id).ok_or_else(|| {
            LinkServiceError::Validation("contentId or slug is required".to_string())
        })?;

        Ok(self.repo.verified_for_content(content_id).await?)
    }

    async fn ensure_partner(&self, partner_id: Option<i64>) -> Result<(), LinkServiceError> {
        if let Some(id) = partner_id {
            if self.partners.get_by_id(id).await?.is_none() {
                return Err(LinkServiceError::NotFound("Partner not found".to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_content, migrated_pool};
    use crate::db::repositories::{SqlxContentRepository, SqlxLinkRepository, SqlxPartnerRepository};
    use crate::db::DynDatabasePool;
    use crate::models::{LinkStatus, LinkType};

    fn service(pool: &DynDatabasePool) -> LinkService {
        LinkService::new(
            SqlxLinkRepository::boxed(pool.clone()),
            SqlxContentRepository::boxed(pool.clone()),
            SqlxPartnerRepository::boxed(pool.clone()),
        )
    }

    #[tokio::test]
    async fn test_create_defaults_to_unverified() {
        let pool = migrated_pool().await;
        let links = service(&pool);
        let content = insert_content(&pool, "kaiju-no-8").await;

        let created = links
            .create(CreateLinkInput::new(content.id, "https://a", "Site A", LinkType::Read))
            .await
            .unwrap();
        assert_eq!(created.status, LinkStatus::Unverified);
        assert_eq!(created.priority, 0);
        assert_eq!(links.get(created.id).await.unwrap().url, "https://a");
    }

    #[tokio::test]
    async fn test_create_validation() {
        let pool = migrated_pool().await;
        let links = service(&pool);
        let content = insert_content(&pool, "sakamoto-days").await;

        let missing = CreateLinkInput {
            content_id: Some(content.id),
            url: Some("https://a".to_string()),
            ..Default::default()
        };
        assert!(matches!(links.create(missing).await, Err(LinkServiceError::Validation(_))));

        let unknown_content = CreateLinkInput::new(4242, "https://a", "A", LinkType::Watch);
        assert!(matches!(
            links.create(unknown_content).await,
            Err(LinkServiceError::NotFound(_))
        ));

        let unknown_partner =
            CreateLinkInput::new(content.id, "https://a", "A", LinkType::Watch).with_partner(77);
        assert!(matches!(
            links.create(unknown_partner).await,
            Err(LinkServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_verified_links_by_id_or_slug() {
        let pool = migrated_pool().await;
        let links = service(&pool);
        let content = insert_content(&pool, "oshi-no-ko").await;

        links
            .create(
                CreateLinkInput::new(content.id, "https://ok", "OK", LinkType::Read)
                    .with_status(LinkStatus::Verified),
            )
            .await
            .unwrap();
        links
            .create(CreateLinkInput::new(content.id, "https://new", "New", LinkType::Read))
            .await
            .unwrap();

        let by_id = links.verified_links(Some(content.id), None).await.unwrap();
        let by_slug = links.verified_links(None, Some("oshi-no-ko")).await.unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_slug.len(), 1);
        assert_eq!(by_slug[0].link.url, "https://ok");

        assert!(matches!(
            links.verified_links(None, None).await,
            Err(LinkServiceError::Validation(_))
        ));
        assert!(matches!(
            links.verified_links(None, Some("nope")).await,
            Err(LinkServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_verified_links_checks_slug_alongside_id() {
        let pool = migrated_pool().await;
        let links = service(&pool);
        let content = insert_content(&pool, "frieren").await;
        let other = insert_content(&pool, "dandadan").await;
        links
            .create(
                CreateLinkInput::new(content.id, "https://read", "Read", LinkType::Read)
                    .with_status(LinkStatus::Verified),
            )
            .await
            .unwrap();

        assert!(matches!(
            links.verified_links(Some(content.id), Some("missing-slug")).await,
            Err(LinkServiceError::NotFound(_))
        ));

        // The id wins when both resolve
        let found = links
            .verified_links(Some(content.id), Some("dandadan"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].link.content_id, content.id);
        assert!(links
            .verified_links(Some(other.id), Some("frieren"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_partial_update_and_delete() {
        let pool = migrated_pool().await;
        let links = service(&pool);
        let content = insert_content(&pool, "spy-family").await;
        let created = links
            .create(
                CreateLinkInput::new(content.id, "https://a", "A", LinkType::Watch).with_priority(2),
            )
            .await
            .unwrap();

        let updated = links
            .update(
                created.id,
                UpdateLinkInput {
                    status: Some(LinkStatus::Blocked),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, LinkStatus::Blocked);
        assert_eq!(updated.priority, 2);
        assert_eq!(updated.url, "https://a");

        links.delete(created.id).await.unwrap();
        assert!(matches!(links.get(created.id).await, Err(LinkServiceError::NotFound(_))));
    }
}
