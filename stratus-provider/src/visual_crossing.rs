//! Visual Crossing Timeline API client.
//!
//! One GET per cache miss:
//! `{base}/VisualCrossingWebServices/rest/services/timeline/{city}?unitGroup=metric&key=..&contentType=json`

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use stratus_core::constants::{
    DEFAULT_PROVIDER_BASE_URL, DEFAULT_PROVIDER_TIMEOUT_SECONDS, PROVIDER_CONTENT_TYPE,
    PROVIDER_TIMELINE_PATH, PROVIDER_UNIT_GROUP,
};
use stratus_core::error::{Result, StratusError};
use stratus_core::traits::WeatherProvider;
use stratus_core::types::WeatherPayload;

use crate::rules::UnknownCityRule;

/// Provider client configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Scheme and host of the API (e.g. "https://weather.visualcrossing.com")
    pub base_url: String,
    /// API key sent as the `key` query parameter
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl ProviderConfig {
    /// Creates config for the public Visual Crossing host.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_PROVIDER_BASE_URL.into(),
            api_key: api_key.into(),
            timeout_seconds: DEFAULT_PROVIDER_TIMEOUT_SECONDS,
        }
    }

    /// Points the client at another host (mirrors, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// HTTP client for the Visual Crossing timeline endpoint.
#[derive(Clone, Debug)]
pub struct VisualCrossingClient {
    config: ProviderConfig,
    base_url: Url,
    http_client: reqwest::Client,
}

impl VisualCrossingClient {
    /// Creates a new client with the given config.
    ///
    /// # Errors
    /// Returns [`StratusError::ConfigError`] if the base URL is invalid or the
    /// HTTP client cannot be built.
    pub fn with_config(config: ProviderConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(StratusError::ConfigError("Weather API key is empty".into()));
        }

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| StratusError::ConfigError(format!("Invalid provider URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StratusError::ConfigError(format!(
                "Provider URL cannot be a base: {}",
                config.base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| StratusError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            base_url,
            http_client,
        })
    }

    /// Builds the timeline URL for `city`.
    ///
    /// The city becomes exactly one percent-encoded path segment.
    pub fn timeline_url(&self, city: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(PROVIDER_TIMELINE_PATH.split('/'))
                .push(city);
        }
        url.query_pairs_mut()
            .clear()
            .append_pair("unitGroup", PROVIDER_UNIT_GROUP)
            .append_pair("key", &self.config.api_key)
            .append_pair("contentType", PROVIDER_CONTENT_TYPE);
        url
    }

    fn transport_error(&self, err: reqwest::Error) -> StratusError {
        if err.is_timeout() {
            StratusError::ProviderTimeout {
                seconds: self.config.timeout_seconds,
            }
        } else {
            // The URL carries the API key.
            StratusError::ProviderTransport(err.without_url().to_string())
        }
    }
}

#[async_trait]
impl WeatherProvider for VisualCrossingClient {
    #[instrument(skip(self))]
    async fn fetch(&self, city: &str) -> Result<WeatherPayload> {
        let response = self
            .http_client
            .get(self.timeline_url(city))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Weather provider returned an error");
            return Err(UnknownCityRule::classify(status, city, body));
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        let payload = WeatherPayload::from_json(body)?;

        debug!(bytes = payload.len(), "Fetched weather from provider");
        Ok(payload)
    }

    fn provider_name(&self) -> &'static str {
        "visualcrossing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMELINE: &str = "/VisualCrossingWebServices/rest/services/timeline";
    const BODY: &str = r#"{"resolvedAddress":"Paris, France","days":[{"temp":18.2}]}"#;

    fn client_for(server: &MockServer) -> VisualCrossingClient {
        VisualCrossingClient::with_config(ProviderConfig::new("test-key").with_base_url(server.uri()))
            .unwrap()
    }

    #[test]
    fn test_timeline_url() {
        let client = VisualCrossingClient::with_config(ProviderConfig::new("abc")).unwrap();
        assert_eq!(
            client.timeline_url("London").as_str(),
            "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline/London?unitGroup=metric&key=abc&contentType=json"
        );
    }

    #[test]
    fn test_timeline_url_encodes_city_segment() {
        let client = VisualCrossingClient::with_config(
            ProviderConfig::new("abc").with_base_url("http://localhost:9000/"),
        )
        .unwrap();
        let url = client.timeline_url("New York/NY");
        assert_eq!(
            url.path(),
            "/VisualCrossingWebServices/rest/services/timeline/New%20York%2FNY"
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(
            VisualCrossingClient::with_config(ProviderConfig::new("  ")),
            Err(StratusError::ConfigError(_))
        ));
        assert!(matches!(
            VisualCrossingClient::with_config(ProviderConfig::new("k").with_base_url("not a url")),
            Err(StratusError::ConfigError(_))
        ));
    }

    #[test]
    fn test_config_debug_hides_key() {
        let debug = format!("{:?}", ProviderConfig::new("super-secret"));
        assert!(!debug.contains("super-secret"));
    }

    #[tokio::test]
    async fn test_fetch_success_passes_body_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/Paris", TIMELINE)))
            .and(query_param("unitGroup", "metric"))
            .and(query_param("key", "test-key"))
            .and(query_param("contentType", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BODY))
            .expect(1)
            .mount(&server)
            .await;

        let payload = client_for(&server).fetch("Paris").await.unwrap();
        assert_eq!(payload.as_str(), BODY);
    }

    #[tokio::test]
    async fn test_fetch_bad_request_is_unknown_city() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/Atlantis", TIMELINE)))
            .respond_with(ResponseTemplate::new(400).set_body_string("Bad API Request:Invalid location parameter value."))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch("Atlantis").await.unwrap_err();
        assert_eq!(err, StratusError::UnknownCity("Atlantis".into()));
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch("Paris").await.unwrap_err();
        assert_eq!(
            err,
            StratusError::ProviderStatus {
                status: 503,
                body: "maintenance".into()
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch("Paris").await.unwrap_err();
        assert!(matches!(err, StratusError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(BODY)
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = VisualCrossingClient::with_config(
            ProviderConfig::new("test-key")
                .with_base_url(server.uri())
                .with_timeout(1),
        )
        .unwrap();

        let err = client.fetch("Paris").await.unwrap_err();
        assert_eq!(err, StratusError::ProviderTimeout { seconds: 1 });
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_hides_key() {
        let client = VisualCrossingClient::with_config(
            ProviderConfig::new("secret-key").with_base_url("http://127.0.0.1:1"),
        )
        .unwrap();

        let err = client.fetch("Paris").await.unwrap_err();
        match err {
            StratusError::ProviderTransport(msg) => assert!(!msg.contains("secret-key")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
