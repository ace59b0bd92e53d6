use crate::core::quote_client::ProviderResponse;
use crate::domain::model::ShipmentRequest;
use crate::domain::ports::RateProvider;
use crate::utils::error::{QuoteError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

/// Rate provider reached over HTTP: one JSON POST per quote.
#[derive(Debug, Clone)]
pub struct HttpRateProvider {
    client: Client,
    endpoint: String,
    headers: HashMap<String, String>,
    timeout_seconds: u64,
}

impl HttpRateProvider {
    pub fn new(endpoint: impl Into<String>, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            headers: HashMap::new(),
            timeout_seconds,
        })
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_send_error(&self, e: reqwest::Error) -> QuoteError {
        if e.is_timeout() {
            QuoteError::Timeout {
                seconds: self.timeout_seconds,
            }
        } else {
            QuoteError::ApiError(e)
        }
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    async fn fetch(&self, request: &ShipmentRequest) -> Result<ProviderResponse> {
        let mut builder = self.client.post(&self.endpoint).json(request);

        // 添加自定義標頭
        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        tracing::debug!("Making rate request to: {}", self.endpoint);
        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        tracing::debug!("Rate provider response status: {}", status);
        if !status.is_success() {
            return Err(QuoteError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        Ok(ProviderResponse::from_body(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FreightClass, LocationType};
    use httpmock::prelude::*;
    use std::collections::BTreeSet;

    fn request() -> ShipmentRequest {
        ShipmentRequest::new(
            "30301".to_string(),
            "90210".to_string(),
            15,
            FreightClass::C70,
            LocationType::Business,
            LocationType::Business,
            BTreeSet::new(),
            "USD".to_string(),
        )
    }

    #[tokio::test]
    async fn test_posts_json_and_parses_options() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/rates")
                .header("x-api-key", "secret")
                .json_body(serde_json::json!({
                    "originPostal": "30301",
                    "destPostal": "90210",
                    "totalLbs": 15,
                    "totalGrams": 6804,
                    "freightClass": "70",
                    "originType": "BUSINESS",
                    "destType": "BUSINESS",
                    "accessorials": [],
                    "currency": "USD"
                }));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"options": [{"amount": 9900, "carrier": "TForce"}]}));
        });

        let mut headers = HashMap::new();
        headers.insert("x-api-key".to_string(), "secret".to_string());
        let provider = HttpRateProvider::new(server.url("/rates"), 5)
            .unwrap()
            .with_headers(headers);

        let response = provider.fetch(&request()).await.unwrap();

        api_mock.assert();
        assert!(matches!(response, ProviderResponse::Options(ref o) if o.len() == 1));
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_failure() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/rates");
            then.status(503);
        });

        let provider = HttpRateProvider::new(server.url("/rates"), 5).unwrap();
        let err = provider.fetch(&request()).await.unwrap_err();

        api_mock.assert();
        assert!(matches!(err, QuoteError::HttpStatus { status: 503 }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/rates");
            then.status(200).body("upstream exploded");
        });

        let provider = HttpRateProvider::new(server.url("/rates"), 5).unwrap();
        let response = provider.fetch(&request()).await.unwrap();

        assert!(matches!(response, ProviderResponse::Malformed(_)));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/rates");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(serde_json::json!({"ok": false}));
        });

        let provider = HttpRateProvider::new(server.url("/rates"), 1).unwrap();
        let err = provider.fetch(&request()).await.unwrap_err();

        assert!(matches!(err, QuoteError::Timeout { seconds: 1 }));
    }
}
