//! In-process cache backed by `moka`.

use async_trait::async_trait;
use moka::future::Cache;

use super::{PersistentCache, validate_key};
use crate::error::CacheError;

/// Upper bound on stored keys. The product store uses a single key; the
/// headroom is for embedders sharing one cache between several stores.
const MAX_KEYS: u64 = 1024;

/// Process-scoped cache.
///
/// Entries live as long as the cache (no TTL). Clones share entries, which
/// makes it a stand-in for browser-style storage in tests and headless runs.
#[derive(Clone)]
pub struct MemoryCache {
    entries: Cache<String, String>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().max_capacity(MAX_KEYS).build(),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

#[async_trait]
impl PersistentCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        validate_key(key)?;
        Ok(self.entries.get(key).await)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        validate_key(key)?;
        self.entries.insert(key.to_string(), value.to_string()).await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_overwrites() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("productsData").await.unwrap(), None);

        cache.set("productsData", "a").await.unwrap();
        cache.set("productsData", "b").await.unwrap();
        assert_eq!(cache.get("productsData").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = MemoryCache::new();
        let other = cache.clone();
        cache.set("k", "v").await.unwrap();
        assert_eq!(other.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
