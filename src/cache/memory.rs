use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;

use super::{CacheError, CacheStore};

/// In-process cache used when Redis is disabled or unreachable at startup.
/// Entries share one time-to-live fixed at construction.
#[derive(Clone)]
pub struct MemoryCache {
    cache: Cache<String, String>,
}

impl MemoryCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.cache.get(key).await)
    }

    async fn set(&self, key: &str, value: &str, _ttl: Duration) -> Result<(), CacheError> {
        self.cache.insert(key.to_string(), value.to_string()).await;
        Ok(())
    }

    async fn evict(&self, key: &str) -> Result<(), CacheError> {
        self.cache.invalidate(key).await;
        Ok(())
    }
}
