use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use weather_core::{ErrorBody, LookupError};

/// Everything the HTTP layer can answer with instead of a summary.
#[derive(Debug)]
pub enum ApiError {
    Lookup(LookupError),
    RateLimited,
    Internal(String),
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        ApiError::Lookup(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Lookup(err) => {
                // Provider codes are passed through; anything out of range is a bad gateway.
                let status =
                    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, err.body())
            }
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorBody {
                    error: "Rate limit exceeded. Try again later.".into(),
                    api_response: None,
                },
            ),
            ApiError::Internal(message) => {
                tracing::error!("Error encountered while processing request: {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Internal server error.".into(),
                        api_response: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
