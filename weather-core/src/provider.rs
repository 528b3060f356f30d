use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{Config, error::LookupError, model::TimelineResponse};

pub mod visualcrossing;

pub use visualcrossing::VisualCrossingProvider;

/// Source of raw forecast data for a city.
///
/// One call is one outbound request: implementations never retry.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn timeline(&self, city: &str) -> Result<TimelineResponse, LookupError>;
}

/// Construct the provider described by `config`.
///
/// A missing API key still yields a provider; it fails each call with
/// [`LookupError::MissingApiKey`] instead of sending anything.
pub fn provider_from_config(config: &Config) -> Arc<dyn WeatherProvider> {
    if config.api_key().is_none() {
        tracing::warn!(
            "No Visual Crossing API key configured; uncached lookups will fail until one is set"
        );
    }

    Arc::new(VisualCrossingProvider::with_base_url(
        config.api_key().map(str::to_owned),
        config.base_url(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn provider_from_config_without_key_fails_calls() {
        let cfg = Config::default();
        let provider = provider_from_config(&cfg);

        let err = provider.timeline("Paris").await.unwrap_err();
        assert!(matches!(err, LookupError::MissingApiKey));
        assert!(err.to_string().contains("API key is missing"));
    }
}
