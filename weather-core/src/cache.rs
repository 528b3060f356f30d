//! Cache store for weather summaries.
//!
//! The lookup only needs `get` and `set` with a TTL, so the backing store is
//! behind [`WeatherCache`]. [`MemoryCache`] is the in-process implementation;
//! it is shared across request handlers through an `Arc`.

use async_trait::async_trait;
use moka::{Expiry, future::Cache};
use std::{
    fmt::Debug,
    time::{Duration, Instant},
};

use crate::model::WeatherSummary;

/// Lifetime of a cached summary: 12 hours.
pub const CACHE_TTL: Duration = Duration::from_secs(43_200);

/// Upper bound on cities held by [`MemoryCache::new`].
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Cache key for a city. Lowercasing is Unicode-aware, so "São Paulo" and
/// "são paulo" share one entry.
pub fn cache_key(city: &str) -> String {
    format!("weather:{}", city.to_lowercase())
}

#[async_trait]
pub trait WeatherCache: Send + Sync + Debug {
    /// Returns the stored summary if present and not expired.
    async fn get(&self, key: &str) -> anyhow::Result<Option<WeatherSummary>>;

    /// Stores `value` under `key`, replacing any previous entry.
    async fn set(&self, key: &str, value: WeatherSummary, ttl: Duration) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
struct Entry {
    value: WeatherSummary,
    ttl: Duration,
}

/// Each entry lives for the TTL it was written with; an overwrite restarts it.
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-memory TTL cache. Expired entries are evicted by moka's housekeeping,
/// whether or not their key is read again.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    entries: Cache<String, Entry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(max_entries: u64) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(EntryTtl)
            .build();

        Self { entries }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WeatherCache for MemoryCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<WeatherSummary>> {
        Ok(self.entries.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: WeatherSummary, ttl: Duration) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), Entry { value, ttl }).await;
        Ok(())
    }
}
