use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything that can end a lookup without a summary.
///
/// None of these are retried; each one maps to exactly one HTTP status.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("API key is missing. Set VISUAL_CROSSING_API_KEY in your .env file.")]
    MissingApiKey,

    #[error("Error fetching weather data: {status} {reason}")]
    Provider {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("Error connecting to the API: {0}")]
    Transport(String),

    #[error("Invalid JSON in API response: {0}")]
    InvalidPayload(String),

    #[error("No forecast data found in API response.")]
    NoForecast,
}

impl LookupError {
    /// Status code the HTTP layer answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            LookupError::MissingApiKey => 500,
            LookupError::Provider { status, .. } => *status,
            LookupError::Transport(_) => 503,
            LookupError::InvalidPayload(_) => 502,
            LookupError::NoForecast => 404,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let api_response = match self {
            LookupError::Provider { body, .. } => Some(body.clone()),
            _ => None,
        };

        ErrorBody {
            error: self.to_string(),
            api_response,
        }
    }
}

/// JSON error payload: always `error`, plus `api_response` for provider errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_response: Option<String>,
}
