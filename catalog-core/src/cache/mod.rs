//! Cache-aside layer for the aggregate package list.
//!
//! The whole catalog lives under one key. Reads populate it on a miss and
//! every mutation deletes it. A cache that is down behaves like an empty one.

mod memory;
mod redis;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::models::Package;

pub use self::memory::MemoryBackend;
pub use self::redis::RedisBackend;

pub const ALL_PACKAGES_KEY: &str = "all_packages";
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Minimal key-value store the catalog cache needs.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set(&self, key: &str, value: String, ttl: Duration) -> anyhow::Result<()>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct CatalogCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl CatalogCache {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    /// Cached package list, or `None` on a miss, a backend error, or an
    /// entry that no longer deserializes.
    pub async fn get(&self) -> Option<Vec<Package>> {
        let cached = match self.backend.get(ALL_PACKAGES_KEY).await {
            Ok(Some(cached)) => cached,
            Ok(None) => {
                debug!("Package list cache miss");
                return None;
            }
            Err(e) => {
                warn!("Reading package list cache failed: {:#}", e);
                return None;
            }
        };

        match serde_json::from_str(&cached) {
            Ok(packages) => {
                debug!("Package list cache hit");
                Some(packages)
            }
            Err(e) => {
                warn!("Discarding undecodable package list cache entry: {}", e);
                None
            }
        }
    }

    pub async fn put(&self, packages: &[Package]) {
        let serialized = match serde_json::to_string(packages) {
            Ok(serialized) => serialized,
            Err(e) => {
                warn!("Serializing package list for cache failed: {}", e);
                return;
            }
        };

        if let Err(e) = self.backend.set(ALL_PACKAGES_KEY, serialized, self.ttl).await {
            warn!("Writing package list cache failed: {:#}", e);
        }
    }

    pub async fn invalidate(&self) {
        if let Err(e) = self.backend.delete(ALL_PACKAGES_KEY).await {
            warn!("Invalidating package list cache failed: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DownBackend;

    #[async_trait]
    impl CacheBackend for DownBackend {
        async fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            anyhow::bail!("connection refused")
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }

        async fn delete(&self, _key: &str) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
    }

    #[tokio::test]
    async fn put_then_get_hits() {
        let cache = CatalogCache::new(Arc::new(MemoryBackend::new()), DEFAULT_TTL);
        let packages = vec![Package::new("zlib"), Package::new("fmt")];

        cache.put(&packages).await;

        assert_eq!(cache.get().await, Some(packages));
    }

    #[tokio::test]
    async fn invalidate_clears_the_list() {
        let cache = CatalogCache::new(Arc::new(MemoryBackend::new()), DEFAULT_TTL);
        cache.put(&[Package::new("zlib")]).await;

        cache.invalidate().await;

        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_miss() {
        let backend = Arc::new(MemoryBackend::new());
        backend
            .set(ALL_PACKAGES_KEY, "{not json".into(), DEFAULT_TTL)
            .await
            .unwrap();
        let cache = CatalogCache::new(backend, DEFAULT_TTL);

        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn unavailable_backend_is_a_silent_miss() {
        let cache = CatalogCache::new(Arc::new(DownBackend), DEFAULT_TTL);

        cache.put(&[Package::new("zlib")]).await;
        cache.invalidate().await;
        assert_eq!(cache.get().await, None);
    }
}
