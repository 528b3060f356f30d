//! Core library for the `weather` service.
//!
//! This crate defines:
//! - Configuration & API key handling
//! - The Visual Crossing timeline client behind a provider trait
//! - A TTL cache store behind a cache trait
//! - The cache-or-fetch lookup that ties them together
//!
//! It is used by `weather-cli` for both the HTTP endpoint and one-off lookups.

pub mod cache;
pub mod config;
pub mod error;
pub mod lookup;
pub mod model;
pub mod provider;

pub use cache::{CACHE_TTL, MemoryCache, WeatherCache, cache_key};
pub use config::Config;
pub use error::{ErrorBody, LookupError};
pub use lookup::{CacheStatus, Lookup, WeatherLookup};
pub use model::{SOURCE_API_FRESH, WeatherSummary};
pub use provider::{VisualCrossingProvider, WeatherProvider, provider_from_config};
