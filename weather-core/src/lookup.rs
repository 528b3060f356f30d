//! Cache-or-fetch lookup of current-day weather for a city.

use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

use crate::{
    cache::{CACHE_TTL, WeatherCache, cache_key},
    error::LookupError,
    model::WeatherSummary,
    provider::WeatherProvider,
};

/// Whether a lookup was answered from the cache or by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub summary: WeatherSummary,
    pub cache: CacheStatus,
}

/// Holds no per-request state; cloning shares the same cache and provider.
#[derive(Debug, Clone)]
pub struct WeatherLookup {
    cache: Arc<dyn WeatherCache>,
    provider: Arc<dyn WeatherProvider>,
    ttl: Duration,
}

impl WeatherLookup {
    pub fn new(cache: Arc<dyn WeatherCache>, provider: Arc<dyn WeatherProvider>) -> Self {
        Self {
            cache,
            provider,
            ttl: CACHE_TTL,
        }
    }

    pub async fn lookup(&self, city: &str) -> Result<Lookup, LookupError> {
        let key = cache_key(city);

        match self.cache.get(&key).await {
            Ok(Some(summary)) => {
                info!(%key, "Data for {city} retrieved from cache");
                return Ok(Lookup {
                    summary,
                    cache: CacheStatus::Hit,
                });
            }
            Ok(None) => {}
            Err(e) => warn!(%key, "Cache read failed, treating as miss: {e:#}"),
        }

        info!(%key, "Data for {city} not found in cache, fetching from provider");

        let timeline = self.provider.timeline(city).await.inspect_err(|e| {
            warn!(%key, status = e.status_code(), "Lookup for {city} failed: {e}");
        })?;

        let Some(day) = timeline.days.as_deref().and_then(<[_]>::first) else {
            warn!(%key, "Provider returned no forecast days for {city}");
            return Err(LookupError::NoForecast);
        };

        let summary = WeatherSummary::from_forecast(timeline.resolved_address.clone(), day);

        info!(
            location = ?summary.location,
            date = ?summary.date,
            temp_max = ?summary.temp_max,
            temp_min = ?summary.temp_min,
            conditions = ?summary.conditions,
            "Fetched fresh weather for {city}"
        );

        if let Err(e) = self.cache.set(&key, summary.clone(), self.ttl).await {
            warn!(%key, "Cache write failed: {e:#}");
        }

        Ok(Lookup {
            summary,
            cache: CacheStatus::Miss,
        })
    }
}
