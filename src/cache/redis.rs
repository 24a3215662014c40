use ::redis::{aio::MultiplexedConnection, AsyncCommands, Client, RedisResult};
use async_trait::async_trait;
use failsafe::backoff::{self, Constant};
use failsafe::failure_policy::{self, ConsecutiveFailures};
use failsafe::futures::CircuitBreaker;
use std::future::Future;
use std::time::Duration;

use super::{CacheError, CacheStore};
use crate::config::RedisConfig;

type Breaker = failsafe::StateMachine<ConsecutiveFailures<Constant>, ()>;

/// Redis-backed cache. After `failure_threshold` consecutive errors the
/// breaker opens and calls are rejected without touching the network until
/// `retry_after_seconds` pass.
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
    breaker: Breaker,
}

impl RedisCache {
    /// Opens the multiplexed connection; fails when Redis is unreachable.
    pub async fn connect(config: &RedisConfig) -> RedisResult<Self> {
        let client = Client::open(config.url.as_str())?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self::new(conn, config))
    }

    pub fn new(conn: MultiplexedConnection, config: &RedisConfig) -> Self {
        let policy = failure_policy::consecutive_failures(
            config.failure_threshold,
            backoff::constant(Duration::from_secs(config.retry_after_seconds)),
        );
        let breaker = failsafe::Config::new().failure_policy(policy).build();
        Self { conn, breaker }
    }

    async fn guarded<T, F>(&self, call: F) -> Result<T, CacheError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match self.breaker.call(call).await {
            Ok(value) => Ok(value),
            Err(failsafe::Error::Inner(e)) => Err(CacheError::Redis(e)),
            Err(failsafe::Error::Rejected) => Err(CacheError::CircuitOpen),
        }
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        self.guarded(async move {
            let value: RedisResult<Option<String>> = conn.get(key).await;
            value
        })
        .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        self.guarded(async move {
            let stored: RedisResult<()> = conn.set_ex(key, value, seconds).await;
            stored
        })
        .await
    }

    async fn evict(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        self.guarded(async move {
            let removed: RedisResult<()> = conn.del(key).await;
            removed
        })
        .await
    }
}
