//! Partner service

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;

use super::{generate_slug, optional_text, required_text};
use crate::db::repositories::PartnerRepository;
use crate::models::{CreatePartnerInput, Partner, PartnerWithLinkCount, UpdatePartnerInput};

const DUPLICATE_NAME: &str = "A partner with this name already exists";

#[derive(Debug, Error)]
pub enum PartnerServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Partner not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Partner service
///
/// Partner slugs are derived from the name and never suffixed, so two
/// partners cannot share a name.
pub struct PartnerService {
    repo: Arc<dyn PartnerRepository>,
}

impl PartnerService {
    pub fn new(repo: Arc<dyn PartnerRepository>) -> Self {
        Self { repo }
    }

    /// Partners by priority_score desc then name, with their link counts
    pub async fn list(&self) -> Result<Vec<PartnerWithLinkCount>, PartnerServiceError> {
        Ok(self.repo.list_with_link_counts().await?)
    }

    pub async fn create(&self, input: CreatePartnerInput) -> Result<Partner, PartnerServiceError> {
        let name = required_text(input.name.as_deref());
        let website_url = required_text(input.website_url.as_deref());
        let (Some(name), Some(website_url)) = (name, website_url) else {
            return Err(PartnerServiceError::Validation(
                "Name and websiteUrl are required".to_string(),
            ));
        };

        let slug = self.claim_slug(&name, None).await?;
        let now = Utc::now();
        let partner = Partner {
            id: 0,
            name,
            slug,
            website_url,
            logo_url: optional_text(input.logo_url),
            is_verified: input.is_verified.unwrap_or(false),
            priority_score: input.priority_score.unwrap_or(0),
            description: optional_text(input.description),
            created_at: now,
            updated_at: now,
        };

        Ok(self.repo.create(&partner).await?)
    }

    pub async fn update(&self, id: i64, input: UpdatePartnerInput) -> Result<Partner, PartnerServiceError> {
        let mut partner = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or(PartnerServiceError::NotFound)?;

        if let Some(raw) = input.name.as_deref() {
            let name = required_text(Some(raw))
                .ok_or_else(|| PartnerServiceError::Validation("Name cannot be empty".to_string()))?;
            if name != partner.name {
                partner.slug = self.claim_slug(&name, Some(id)).await?;
                partner.name = name;
            }
        }
        if let Some(raw) = input.website_url.as_deref() {
            partner.website_url = required_text(Some(raw)).ok_or_else(|| {
                PartnerServiceError::Validation("websiteUrl cannot be empty".to_string())
            })?;
        }
        if let Some(logo_url) = input.logo_url {
            partner.logo_url = optional_text(logo_url);
        }
        if let Some(is_verified) = input.is_verified {
            partner.is_verified = is_verified;
        }
        if let Some(priority_score) = input.priority_score {
            partner.priority_score = priority_score;
        }
        if let Some(description) = input.description {
            partner.description = optional_text(description);
        }

        Ok(self.repo.update(&partner).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), PartnerServiceError> {
        if !self.repo.delete(id).await? {
            return Err(PartnerServiceError::NotFound);
        }
        Ok(())
    }

    async fn claim_slug(&self, name: &str, exclude_id: Option<i64>) -> Result<String, PartnerServiceError> {
        let slug = generate_slug(name);
        if self.repo.slug_exists(&slug, exclude_id).await? {
            return Err(PartnerServiceError::Validation(DUPLICATE_NAME.to_string()));
        }
        Ok(slug)
    }
}
