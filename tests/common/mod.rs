#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use cinema_booking::cache::{CacheError, CacheService, CacheStore, MemoryCache};
use cinema_booking::config::Config;
use cinema_booking::models::{Member, Schedule};
use cinema_booking::services::{FixedClock, ReservationNumberGenerator};
use cinema_booking::store::{MemoryStore, ScheduleDirectory};
use cinema_booking::AppState;

pub const SEATS: i32 = 20;

/// Cache whose backend is always down.
pub struct UnreachableCache;

#[async_trait]
impl CacheStore for UnreachableCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::CircuitOpen)
    }
    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::CircuitOpen)
    }
    async fn evict(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::CircuitOpen)
    }
}

/// In-process cache that can hold the next `set` until released.
pub struct GatedCache {
    inner: MemoryCache,
    armed: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl GatedCache {
    pub fn new() -> Self {
        Self {
            inner: MemoryCache::new(1_000, Duration::from_secs(60)),
            armed: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn hold_next_write(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStore for GatedCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(key).await
    }
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.set(key, value, ttl).await
    }
    async fn evict(&self, key: &str) -> Result<(), CacheError> {
        self.inner.evict(key).await
    }
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryCache>,
    pub state: Arc<AppState>,
    pub member: Member,
    pub schedule: Schedule,
}

pub fn booking_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
}

pub async fn fixture() -> Fixture {
    build(None, ReservationNumberGenerator::new()).await
}

pub async fn fixture_with_cache(cache: Arc<dyn CacheStore>) -> Fixture {
    build(Some(cache), ReservationNumberGenerator::new()).await
}

pub async fn fixture_with_numbers(numbers: ReservationNumberGenerator) -> Fixture {
    build(None, numbers).await
}

async fn build(
    cache_store: Option<Arc<dyn CacheStore>>,
    numbers: ReservationNumberGenerator,
) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let member = add_member(&store).await;
    let schedule = store
        .insert_schedule(
            "Spirited Away",
            "Hall 1",
            SEATS,
            Utc::now() + ChronoDuration::hours(3),
        )
        .await;
    store
        .create_seat_statuses(schedule.id, schedule.seat_count)
        .await
        .unwrap();

    let cache = Arc::new(MemoryCache::new(1_000, Duration::from_secs(60)));
    let cache_store = cache_store.unwrap_or_else(|| cache.clone() as Arc<dyn CacheStore>);
    let state = Arc::new(AppState::with_store(
        test_config(),
        store.clone(),
        CacheService::new(cache_store, Duration::from_secs(60)),
        Arc::new(numbers),
        Arc::new(FixedClock(booking_day())),
    ));

    Fixture {
        store,
        cache,
        state,
        member,
        schedule,
    }
}

pub async fn add_member(store: &MemoryStore) -> Member {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    store.insert_member(&name, &email).await
}

pub fn test_config() -> Config {
    Config::builder()
        .unwrap()
        .set_override("reservation.store", "memory")
        .unwrap()
        .set_override("redis.enabled", false)
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap()
}
