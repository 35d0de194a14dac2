//! HTTP gateway for the indicator values API.
//!
//! Endpoints (relative to the configured base URL):
//! - `GET  indicators/{id}/values`
//! - `PUT  indicators/{id}/values`
//! - `GET  data-types`
//! - `GET  units`

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::*;
use crate::config::GatewayConfig;
use crate::error::{EditorError, Result};
use crate::types::{DataType, IndicatorValueGrid, UnitGroups, ValueUpdate};

/// Error body returned by the API on non-success responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// `reqwest`-backed gateway.
pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpGateway {
    /// Create a gateway from configuration.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| EditorError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create a gateway configured from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(GatewayConfig::from_env()?)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn values_url(&self, indicator_id: &str) -> String {
        self.config.endpoint(&format!(
            "indicators/{}/values",
            urlencoding::encode(indicator_id)
        ))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> std::result::Result<T, GatewayError> {
        debug!(url = %url, "GET");
        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(what.to_string()));
        }

        if !response.status().is_success() {
            let message = error_message(response).await;
            return Err(GatewayError::Network(message));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }
}

/// Pull a human-readable message out of an error response.
///
/// Prefers the JSON `message` field, falling back to the status text.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let fallback = status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string());

    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(fallback)
}

#[async_trait]
impl IndicatorGateway for HttpGateway {
    async fn fetch_values(&self, indicator_id: &str) -> std::result::Result<IndicatorValueGrid, GatewayError> {
        let url = self.values_url(indicator_id);
        self.get_json(&url, &format!("indicator {}", indicator_id)).await
    }

    async fn submit_updates(
        &self,
        indicator_id: &str,
        updates: &[ValueUpdate],
    ) -> std::result::Result<(), GatewayError> {
        let url = self.values_url(indicator_id);
        debug!(url = %url, count = updates.len(), "PUT");

        let response = self
            .client
            .put(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(updates)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = error_message(response).await;
        warn!(indicator_id = %indicator_id, status = status.as_u16(), "Update batch failed: {}", message);

        if status.is_client_error() {
            Err(GatewayError::Validation(message))
        } else {
            Err(GatewayError::Network(message))
        }
    }

    async fn fetch_data_types(&self) -> std::result::Result<Vec<DataType>, GatewayError> {
        let url = self.config.endpoint("data-types");
        self.get_json(&url, "data types").await
    }

    async fn fetch_units(&self) -> std::result::Result<UnitGroups, GatewayError> {
        let url = self.config.endpoint("units");
        self.get_json(&url, "units").await
    }
}
