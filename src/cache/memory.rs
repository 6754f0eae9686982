//! In-memory cache backed by moka
//!
//! Entries are JSON strings that expire after the TTL passed to `set`.

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use moka::Expiry;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct Entry {
    json: Arc<String>,
    ttl: Duration,
}

/// Expires each entry after its own TTL
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

pub struct MemoryCache {
    entries: MokaCache<String, Entry>,
    default_ttl: Duration,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.entries.entry_count())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl MemoryCache {
    /// `default_ttl` is what services pass to `set` unless they pick their own
    pub fn with_capacity_and_ttl(max_capacity: u64, default_ttl: Duration) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            entries,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

#[async_trait]
impl CacheLayer for MemoryCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        let Some(entry) = self.entries.get(key).await else {
            return Ok(None);
        };
        let value = serde_json::from_str(&entry.json)
            .with_context(|| format!("Failed to deserialize cache entry '{}'", key))?;
        Ok(Some(value))
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        self.entries
            .insert(
                key.to_string(),
                Entry {
                    json: Arc::new(json),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.invalidate(key).await;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<()> {
        let stale: Vec<String> = self
            .entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| (*key).clone())
            .collect();

        for key in stale {
            self.entries.invalidate(&key).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct CachedCategory {
        id: i64,
        slug: String,
    }

    fn cache() -> MemoryCache {
        MemoryCache::with_capacity_and_ttl(100, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_get_set_delete() {
        let cache = cache();
        assert!(cache.get::<String>("missing").await.unwrap().is_none());

        let list = vec![
            CachedCategory { id: 1, slug: "action".into() },
            CachedCategory { id: 2, slug: "drama".into() },
        ];
        cache.set("categories:MANGA", &list, cache.default_ttl()).await.unwrap();
        assert_eq!(
            cache.get::<Vec<CachedCategory>>("categories:MANGA").await.unwrap(),
            Some(list)
        );

        cache.delete("categories:MANGA").await.unwrap();
        cache.delete("never-set").await.unwrap();
        assert!(cache.get::<Vec<CachedCategory>>("categories:MANGA").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wrong_type_is_error() {
        let cache = cache();
        cache.set("n", &42_i64, Duration::from_secs(60)).await.unwrap();
        assert!(cache.get::<CachedCategory>("n").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_prefix_keeps_other_keys() {
        let cache = cache();
        let ttl = Duration::from_secs(60);
        cache.set("categories:MANGA", &1, ttl).await.unwrap();
        cache.set("categories:ANIME", &2, ttl).await.unwrap();
        cache.set("settings", &3, ttl).await.unwrap();

        cache.delete_prefix("categories:").await.unwrap();

        assert!(cache.get::<i32>("categories:MANGA").await.unwrap().is_none());
        assert!(cache.get::<i32>("categories:ANIME").await.unwrap().is_none());
        assert_eq!(cache.get::<i32>("settings").await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_per_entry_ttl() {
        let cache = cache();
        cache.set("short", &"gone", Duration::from_millis(20)).await.unwrap();
        cache.set("long", &"kept", Duration::from_secs(60)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;
        cache.entries.run_pending_tasks().await;

        assert!(cache.get::<String>("short").await.unwrap().is_none());
        assert_eq!(cache.get::<String>("long").await.unwrap().as_deref(), Some("kept"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn stored_values_read_back(key in "[a-z]{1,10}", value in "[a-z ]{0,50}") {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let read = rt.block_on(async {
                let cache = cache();
                cache.set(&key, &value, Duration::from_secs(60)).await.unwrap();
                cache.get::<String>(&key).await.unwrap()
            });
            prop_assert_eq!(read, Some(value));
        }
    }
}
