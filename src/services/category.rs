//! Category service
//!
//! Admin CRUD for categories and the cached per-type lists used by the
//! public catalog filters.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::{generate_slug, required_text, unique_slug};
use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::CategoryRepository;
use crate::models::{Category, ContentType, CreateCategoryInput, UpdateCategoryInput};

/// Cache key prefix of the public per-type lists
const CACHE_KEY_FOR_TYPE: &str = "categories:";

#[derive(Debug, Error)]
pub enum CategoryServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Category not found: {0}")]
    NotFound(i64),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Category service
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>, cache: Arc<Cache>) -> Self {
        let cache_ttl = cache.default_ttl();
        Self {
            repo,
            cache,
            cache_ttl,
        }
    }

    /// Categories offered for one content type, sort_order ascending
    ///
    /// Includes universal categories. Results are cached per type.
    pub async fn list_public_for_type(
        &self,
        content_type: ContentType,
    ) -> Result<Vec<Category>, CategoryServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_FOR_TYPE, content_type);
        if let Some(list) = self.cache.get::<Vec<Category>>(&cache_key).await.ok().flatten() {
            return Ok(list);
        }

        let list = self.repo.list_for_type(content_type).await?;
        let _ = self.cache.set(&cache_key, &list, self.cache_ttl).await;

        Ok(list)
    }

    pub async fn list_all(&self) -> Result<Vec<Category>, CategoryServiceError> {
        Ok(self.repo.list_all().await?)
    }

    pub async fn create(&self, input: CreateCategoryInput) -> Result<Category, CategoryServiceError> {
        let name = required_text(input.name.as_deref());
        let (Some(name), Some(type_scope)) = (name, input.type_scope) else {
            return Err(CategoryServiceError::Validation(
                "Name and typeScope are required".to_string(),
            ));
        };

        let slug = self.free_slug(&name, None).await?;
        let now = Utc::now();
        let category = Category {
            id: 0,
            name,
            slug,
            type_scope,
            sort_order: input.sort_order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(&category).await?;
        self.invalidate_cache().await;

        Ok(created)
    }

    /// Partial update. A name change also regenerates the slug.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateCategoryInput,
    ) -> Result<Category, CategoryServiceError> {
        let mut category = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(CategoryServiceError::NotFound(id))?;

        if let Some(raw) = input.name.as_deref() {
            let name = required_text(Some(raw))
                .ok_or_else(|| CategoryServiceError::Validation("Name cannot be empty".to_string()))?;
            if name != category.name {
                category.slug = self.free_slug(&name, Some(id)).await?;
                category.name = name;
            }
        }
        if let Some(type_scope) = input.type_scope {
            category.type_scope = type_scope;
        }
        if let Some(sort_order) = input.sort_order {
            category.sort_order = sort_order;
        }

        let updated = self.repo.update(&category).await?;
        self.invalidate_cache().await;

        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), CategoryServiceError> {
        if !self.repo.delete(id).await? {
            return Err(CategoryServiceError::NotFound(id));
        }
        self.invalidate_cache().await;
        Ok(())
    }

    async fn free_slug(&self, name: &str, exclude_id: Option<i64>) -> anyhow::Result<String> {
        let repo = &self.repo;
        unique_slug(&generate_slug(name), |slug| async move {
            repo.slug_exists(&slug, exclude_id).await
        })
        .await
    }

    async fn invalidate_cache(&self) {
        if let Err(e) = self.cache.delete_prefix(CACHE_KEY_FOR_TYPE).await {
            tracing::warn!("Failed to invalidate category cache: {}", e);
        }
    }
}
