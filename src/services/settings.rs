//! Settings service
//!
//! The single settings row is created with defaults on first read and kept
//! in the cache between reads.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::SettingsRepository;
use crate::models::{SiteSettings, UpdateSettingsInput};

const CACHE_KEY: &str = "settings";

#[derive(Debug, Error)]
pub enum SettingsServiceError {
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Settings service
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl SettingsService {
    pub fn new(repo: Arc<dyn SettingsRepository>, cache: Arc<Cache>) -> Self {
        let cache_ttl = cache.default_ttl();
        Self {
            repo,
            cache,
            cache_ttl,
        }
    }

    /// Current settings, inserting the default row when none exists
    pub async fn get_or_create(&self) -> Result<SiteSettings, SettingsServiceError> {
        if let Some(settings) = self.cache.get::<SiteSettings>(CACHE_KEY).await.ok().flatten() {
            return Ok(settings);
        }

        let settings = match self.repo.get().await? {
            Some(settings) => settings,
            None => {
                tracing::info!("Creating default site settings");
                self.repo.create_default().await?
            }
        };
        let _ = self.cache.set(CACHE_KEY, &settings, self.cache_ttl).await;

        Ok(settings)
    }

    pub async fn update(&self, input: UpdateSettingsInput) -> Result<SiteSettings, SettingsServiceError> {
        let current = self.get_or_create().await?;
        let updated = self.repo.update(&input.apply_to(current)).await?;

        if let Err(e) = self.cache.delete(CACHE_KEY).await {
            tracing::warn!("Failed to invalidate settings cache: {}", e);
        }
        Ok(updated)
    }
}
