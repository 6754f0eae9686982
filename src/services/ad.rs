//! Ad service

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use super::{optional_text, required_text};
use crate::db::repositories::AdRepository;
use crate::models::{Ad, CreateAdInput, UpdateAdInput};

#[derive(Debug, Error)]
pub enum AdServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Ad not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Ad service
pub struct AdService {
    repo: Arc<dyn AdRepository>,
}

impl AdService {
    pub fn new(repo: Arc<dyn AdRepository>) -> Self {
        Self { repo }
    }

    /// All ads ordered by position, sort_order, id
    pub async fn list(&self) -> Result<Vec<Ad>, AdServiceError> {
        Ok(self.repo.list().await?)
    }

    /// Ads to render at `position` right now
    pub async fn active_for_position(
        &self,
        position: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Ad>, AdServiceError> {
        Ok(self.repo.list_active(position, now).await?)
    }

    pub async fn create(&self, input: CreateAdInput) -> Result<Ad, AdServiceError> {
        let position = required_text(input.position.as_deref());
        let (Some(position), Some(ad_type)) = (position, input.ad_type) else {
            return Err(AdServiceError::Validation(
                "Position and type (IMAGE or SCRIPT) are required".to_string(),
            ));
        };
        validate_window(input.start_date, input.end_date)?;

        let now = Utc::now();
        let ad = Ad {
            id: 0,
            position,
            ad_type,
            image_url: optional_text(input.image_url),
            script_code: optional_text(input.script_code),
            target_url: optional_text(input.target_url),
            is_active: input.is_active.unwrap_or(true),
            start_date: input.start_date,
            end_date: input.end_date,
            sort_order: input.sort_order.unwrap_or(0),
            created_at: now,
            updated_at: now,
        };

        Ok(self.repo.create(&ad).await?)
    }

    /// Partial update. `null` clears an optional field.
    pub async fn update(&self, id: i64, input: UpdateAdInput) -> Result<Ad, AdServiceError> {
        let mut ad = self.repo.get_by_id(id).await?.ok_or(AdServiceError::NotFound)?;

        if let Some(raw) = input.position.as_deref() {
            ad.position = required_text(Some(raw))
                .ok_or_else(|| AdServiceError::Validation("Position cannot be empty".to_string()))?;
        }
        if let Some(ad_type) = input.ad_type {
            ad.ad_type = ad_type;
        }
        if let Some(image_url) = input.image_url {
            ad.image_url = optional_text(image_url);
        }
        if let Some(script_code) = input.script_code {
            ad.script_code = optional_text(script_code);
        }
        if let Some(target_url) = input.target_url {
            ad.target_url = optional_text(target_url);
        }
        if let Some(is_active) = input.is_active {
            ad.is_active = is_active;
        }
        if let Some(start_date) = input.start_date {
            ad.start_date = start_date;
        }
        if let Some(end_date) = input.end_date {
            ad.end_date = end_date;
        }
        if let Some(sort_order) = input.sort_order {
            ad.sort_order = sort_order;
        }
        validate_window(ad.start_date, ad.end_date)?;

        Ok(self.repo.update(&ad).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), AdServiceError> {
        if !self.repo.delete(id).await? {
            return Err(AdServiceError::NotFound);
        }
        Ok(())
    }
}

fn validate_window(
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<(), AdServiceError> {
    match (start_date, end_date) {
        (Some(start), Some(end)) if end < start => Err(AdServiceError::Validation(
            "endDate must not be before startDate".to_string(),
        )),
        _ => Ok(()),
    }
}
