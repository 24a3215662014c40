use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::ReservationView;

pub mod memory;
pub mod redis;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("cache payload error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache backend temporarily disabled after repeated failures")]
    CircuitOpen,
}

/// Key/value backend for read-through and write-through caching.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
    async fn evict(&self, key: &str) -> Result<(), CacheError>;
}

/// Reservation cache on top of a `CacheStore`.
///
/// Every failure is logged and swallowed: the store stays the source of truth
/// and a missing or broken cache only costs a round trip.
#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl CacheService {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub async fn get_reservation(&self, id: i64) -> Option<ReservationView> {
        let key = reservation_key(id);
        let cached = match self.store.get(&key).await {
            Ok(Some(cached)) => cached,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, key = %key, "cache read failed, falling back to store");
                return None;
            }
        };

        match serde_json::from_str(&cached) {
            Ok(view) => {
                debug!(key = %key, "reservation cache hit");
                Some(view)
            }
            Err(e) => {
                // Битую запись выкидываем, следующий запрос перезапишет её
                warn!(error = %e, key = %key, "dropping unreadable cache entry");
                self.evict_key(&key).await;
                None
            }
        }
    }

    pub async fn save_reservation(&self, view: &ReservationView) {
        let key = reservation_key(view.id);
        let result = match serde_json::to_string(view) {
            Ok(data) => self.store.set(&key, &data, self.ttl).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!(error = %e, key = %key, "cache write failed");
        }
    }

    pub async fn evict_reservation(&self, id: i64) {
        self.evict_key(&reservation_key(id)).await;
    }

    async fn evict_key(&self, key: &str) {
        if let Err(e) = self.store.evict(key).await {
            warn!(error = %e, key = %key, "cache eviction failed");
        }
    }
}

pub fn reservation_key(id: i64) -> String {
    format!("reservation:{}", id)
}
