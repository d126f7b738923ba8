//! External regional source
//!
//! Fetches the full current snapshot of regionals from the system of record.
//! There is no pagination or incremental fetch: every call returns the whole
//! list.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::models::ExternalRegionalRecord;

/// Default endpoint of the external regional list
pub const DEFAULT_REGIONAIS_URL: &str = "https://integrador-argus-api.geia.vip/v1/regionais";

/// Default timeout for the external fetch
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("catalog-rs/", env!("CARGO_PKG_VERSION"));

/// The external snapshot could not be obtained
#[derive(Debug, Error)]
pub enum ExternalFetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("External API returned error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Source of the external regional snapshot
#[async_trait]
pub trait RegionalSource: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<ExternalRegionalRecord>, ExternalFetchError>;
}

/// HTTP client for the external regional list
pub struct HttpRegionalClient {
    http_client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpRegionalClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ExternalFetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ExternalFetchError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            url: url.into(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_request_error(&self, err: reqwest::Error) -> ExternalFetchError {
        if err.is_timeout() {
            ExternalFetchError::Timeout(self.timeout)
        } else if err.is_decode() {
            ExternalFetchError::Parse(err.to_string())
        } else {
            ExternalFetchError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl RegionalSource for HttpRegionalClient {
    async fn fetch_all(&self) -> Result<Vec<ExternalRegionalRecord>, ExternalFetchError> {
        tracing::debug!(url = %self.url, "Fetching external regionais");

        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ExternalFetchError::Api(status.as_u16(), error_text));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_request_error(e))?;

        // A literal `null` body is an empty list
        let records: Option<Vec<ExternalRegionalRecord>> = serde_json::from_slice(&body)
            .map_err(|e| ExternalFetchError::Parse(e.to_string()))?;
        let records = records.unwrap_or_default();

        tracing::debug!(count = records.len(), "External regionais fetched");
        Ok(records)
    }
}
