pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::{CacheService, CacheStore, MemoryCache, RedisCache};
use crate::config::{Config, StoreBackend};
use crate::database::Database;
use crate::services::{ReservationNumberGenerator, ReservationService, SeatService, SystemClock};
use crate::store::{MemberDirectory, MemoryStore, PgStore, ReservationStore, ScheduleDirectory};

// Shared state для всего приложения
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub reservations: ReservationService,
    pub seats: SeatService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let cache = CacheService::new(
            connect_cache(&config).await,
            Duration::from_secs(config.reservation.cache_ttl_seconds),
        );
        let numbers = Arc::new(ReservationNumberGenerator::new());
        let clock = Arc::new(SystemClock);

        let state = match config.reservation.store {
            StoreBackend::Postgres => {
                let db = Database::new(&config.database).await?;
                info!("Database connected");
                db.run_migrations().await?;
                let store = Arc::new(PgStore::new(&db));
                Self::with_store(config, store, cache, numbers, clock)
            }
            StoreBackend::Memory => {
                warn!("Using in-memory store with demo data; bookings are lost on restart");
                let store = Arc::new(MemoryStore::with_demo_data().await);
                Self::with_store(config, store, cache, numbers, clock)
            }
        };

        Ok(Arc::new(state))
    }

    /// Wires services over a single backend that provides every store capability.
    pub fn with_store<S>(
        config: Config,
        store: Arc<S>,
        cache: CacheService,
        numbers: Arc<ReservationNumberGenerator>,
        clock: Arc<dyn services::Clock>,
    ) -> Self
    where
        S: MemberDirectory + ScheduleDirectory + ReservationStore + 'static,
    {
        let members: Arc<dyn MemberDirectory> = store.clone();
        let schedules: Arc<dyn ScheduleDirectory> = store.clone();
        let reservations: Arc<dyn ReservationStore> = store;

        Self {
            config,
            reservations: ReservationService::new(
                members,
                schedules.clone(),
                reservations,
                cache,
                numbers,
                clock,
            ),
            seats: SeatService::new(schedules),
        }
    }
}

/// Redis when enabled and reachable, otherwise an in-process cache.
async fn connect_cache(config: &Config) -> Arc<dyn CacheStore> {
    let ttl = Duration::from_secs(config.reservation.cache_ttl_seconds);
    let in_process = || -> Arc<dyn CacheStore> {
        Arc::new(MemoryCache::new(config.reservation.memory_cache_capacity, ttl))
    };

    if !config.redis.enabled {
        info!("Redis disabled, using in-process cache");
        return in_process();
    }

    match RedisCache::connect(&config.redis).await {
        Ok(redis) => {
            info!("Redis connected");
            Arc::new(redis)
        }
        Err(e) => {
            // Кеш не влияет на корректность, поэтому стартуем без Redis
            warn!(error = %e, "Redis unavailable, falling back to in-process cache");
            in_process()
        }
    }
}
