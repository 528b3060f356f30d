use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::{error::LookupError, model::TimelineResponse};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";

#[derive(Debug, Clone)]
pub struct VisualCrossingProvider {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl VisualCrossingProvider {
    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    /// Timeline URL for `city`, without the query string. The city is one
    /// fully percent-encoded path segment.
    pub fn timeline_url(&self, city: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(city))
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }
}

#[async_trait]
impl WeatherProvider for VisualCrossingProvider {
    async fn timeline(&self, city: &str) -> Result<TimelineResponse, LookupError> {
        let api_key = self.api_key().ok_or(LookupError::MissingApiKey)?;

        let res = self
            .http
            .get(self.timeline_url(city))
            .query(&[
                ("unitGroup", "metric"),
                ("contentType", "json"),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_else(|e| {
                warn!(status = status.as_u16(), "Failed to read error response body: {e}");
                String::new()
            });
            let reason = status.canonical_reason().unwrap_or("Unknown").to_string();

            warn!(
                status = status.as_u16(),
                api_response = %truncate_body(&body),
                "Error fetching weather data: {} {}",
                status.as_u16(),
                reason
            );

            return Err(LookupError::Provider {
                status: status.as_u16(),
                reason,
                body,
            });
        }

        let body = res.text().await.map_err(transport_error)?;

        let parsed: TimelineResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(error = %e, body = %truncate_body(&body), "Failed to parse timeline JSON");
            LookupError::InvalidPayload(e.to_string())
        })?;

        debug!(
            resolved_address = ?parsed.resolved_address,
            days = parsed.days.as_ref().map_or(0, Vec::len),
            "Weather data received for {city}"
        );

        Ok(parsed)
    }
}

/// Reason text for a request that never produced a response.
///
/// The URL is stripped because its query string carries the API key.
fn transport_error(err: reqwest::Error) -> LookupError {
    let err = err.without_url();

    let mut reason = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(inner) = source {
        reason.push_str(": ");
        reason.push_str(&inner.to_string());
        source = inner.source();
    }

    warn!("Error connecting to the weather API: {reason}");
    LookupError::Transport(reason)
}

fn truncate_body(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn paris_timeline() -> serde_json::Value {
        serde_json::json!({
            "resolvedAddress": "Paris, France",
            "days": [{
                "datetime": "2024-01-01",
                "tempmax": 10,
                "tempmin": 2,
                "description": "Clear"
            }]
        })
    }

    #[test]
    fn timeline_url_encodes_city_as_one_segment() {
        let provider = VisualCrossingProvider::with_base_url(None, "http://host/timeline/");

        assert_eq!(provider.timeline_url("Paris"), "http://host/timeline/Paris");
        assert_eq!(provider.timeline_url("New York"), "http://host/timeline/New%20York");
        assert_eq!(
            provider.timeline_url("São Paulo"),
            "http://host/timeline/S%C3%A3o%20Paulo"
        );
        assert_eq!(provider.timeline_url("a/b?c"), "http://host/timeline/a%2Fb%3Fc");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        assert_eq!(truncate_body(&long).chars().count(), 200);
        assert_eq!(truncate_body("short"), "short");
    }

    #[tokio::test]
    async fn sends_fixed_query_parameters() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/timeline/S%C3%A3o%20Paulo"))
            .and(query_param("unitGroup", "metric"))
            .and(query_param("contentType", "json"))
            .and(query_param("key", "TEST_KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris_timeline()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = VisualCrossingProvider::with_base_url(
            Some("TEST_KEY".into()),
            format!("{}/timeline", mock_server.uri()),
        );

        let timeline = provider.timeline("São Paulo").await.unwrap();
        assert_eq!(timeline.resolved_address, Some(serde_json::json!("Paris, France")));
    }

    #[tokio::test]
    async fn missing_key_sends_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris_timeline()))
            .expect(0)
            .mount(&mock_server)
            .await;

        for key in [None, Some(String::new())] {
            let provider = VisualCrossingProvider::with_base_url(key, mock_server.uri());
            let err = provider.timeline("Paris").await.unwrap_err();
            assert!(matches!(err, LookupError::MissingApiKey));
        }
    }

    #[tokio::test]
    async fn http_error_keeps_status_reason_and_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/Paris"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = VisualCrossingProvider::with_base_url(Some("BAD".into()), mock_server.uri());
        let err = provider.timeline("Paris").await.unwrap_err();

        match err {
            LookupError::Provider {
                status,
                reason,
                body,
            } => {
                assert_eq!(status, 401);
                assert_eq!(reason, "Unauthorized");
                assert_eq!(body, "invalid key");
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_canonical_status_gets_placeholder_reason() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(599).set_body_string("upstream exploded"))
            .mount(&mock_server)
            .await;

        let provider = VisualCrossingProvider::with_base_url(Some("KEY".into()), mock_server.uri());
        let err = provider.timeline("Paris").await.unwrap_err();

        assert_eq!(err.status_code(), 599);
        assert_eq!(err.to_string(), "Error fetching weather data: 599 Unknown");
        assert_eq!(err.body().api_response.as_deref(), Some("upstream exploded"));
    }

    #[tokio::test]
    async fn unreadable_error_body_still_reports_status() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await.unwrap();
            // Promise more body than is sent, then hang up.
            socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\nshort")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let provider =
            VisualCrossingProvider::with_base_url(Some("KEY".into()), format!("http://{addr}"));
        let err = provider.timeline("Paris").await.unwrap_err();

        assert_eq!(err.status_code(), 500);
        assert_eq!(err.to_string(), "Error fetching weather data: 500 Internal Server Error");
        assert_eq!(err.body().api_response.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        // Nothing listens on port 1 on the loopback interface.
        let provider =
            VisualCrossingProvider::with_base_url(Some("SECRET".into()), "http://127.0.0.1:1");
        let err = provider.timeline("Paris").await.unwrap_err();

        let LookupError::Transport(reason) = &err else {
            panic!("expected transport error, got {err:?}");
        };
        assert!(!reason.is_empty());
        assert!(!reason.contains("SECRET"), "reason leaks the API key: {reason}");
        assert!(err.to_string().starts_with("Error connecting to the API: "));
    }

    #[tokio::test]
    async fn non_json_body_is_invalid_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let provider = VisualCrossingProvider::with_base_url(Some("KEY".into()), mock_server.uri());
        let err = provider.timeline("Paris").await.unwrap_err();

        assert!(matches!(err, LookupError::InvalidPayload(_)));
        assert_eq!(err.status_code(), 502);
    }
}
