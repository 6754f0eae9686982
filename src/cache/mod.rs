//! Cache layer
//!
//! Process-local caching of hot read models (site settings, category lists).
//! Values are stored as JSON so any serializable type can be cached.
//!
//! ```rust,ignore
//! use bookmark::cache::{create_cache, CacheLayer};
//! use bookmark::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default()).await?;
//! cache.set("settings", &settings, cache.default_ttl()).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Maximum number of cached entries
const MAX_CAPACITY: u64 = 10_000;

/// Operations the services rely on
///
/// The methods are generic, so the trait is not object safe and services
/// hold the concrete [`Cache`].
#[async_trait]
pub trait CacheLayer: Send + Sync {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Drop every entry whose key starts with `prefix`
    async fn delete_prefix(&self, prefix: &str) -> Result<()>;
}

/// The cache shared by all services
pub type Cache = MemoryCache;

/// Create the cache configured by `config`
pub async fn create_cache(config: &CacheConfig) -> Result<Arc<Cache>> {
    let ttl = Duration::from_secs(config.ttl_seconds);
    tracing::debug!("Creating memory cache with {:?} default ttl", ttl);
    Ok(Arc::new(MemoryCache::with_capacity_and_ttl(MAX_CAPACITY, ttl)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_cache_from_config() {
        let cache = create_cache(&CacheConfig { ttl_seconds: 1800 }).await.unwrap();
        assert_eq!(cache.default_ttl(), Duration::from_secs(1800));

        cache
            .set("settings", &"cached".to_string(), cache.default_ttl())
            .await
            .unwrap();
        let result: Option<String> = cache.get("settings").await.unwrap();
        assert_eq!(result.as_deref(), Some("cached"));
    }
}
