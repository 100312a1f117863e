//! HTTP magnet search backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::SearchConfig;

use super::{MagnetSearcher, SearchError};

const STATUS_SUCCEED: &str = "succeed";

/// Searcher for services answering `GET {url}/{code}` with
/// `{"status": "succeed", "data": [record, ...]}`.
pub struct HttpSearcher {
    client: Client,
    config: SearchConfig,
}

impl HttpSearcher {
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| {
                SearchError::ConnectionFailed(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    fn search_url(&self, code: &str) -> String {
        format!(
            "{}/{}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(code)
        )
    }
}

#[async_trait]
impl MagnetSearcher for HttpSearcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn search(&self, code: &str) -> Result<Vec<String>, SearchError> {
        let url = self.search_url(code);
        debug!(code, url = %url, "Searching for catalog code");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                SearchError::Timeout
            } else if e.is_connect() {
                SearchError::ConnectionFailed(e.to_string())
            } else {
                SearchError::InvalidResponse(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Upstream(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        body.into_records()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    data: Option<Vec<serde_json::Value>>,
}

impl SearchResponse {
    /// Records as strings; structured array records are re-encoded as JSON.
    fn into_records(self) -> Result<Vec<String>, SearchError> {
        match self.status.as_deref() {
            Some(STATUS_SUCCEED) => {}
            other => {
                let status = other.unwrap_or("missing").to_string();
                warn!(status = %status, "Search service reported failure");
                return Err(SearchError::Upstream(format!("status {}", status)));
            }
        }

        Ok(self
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|value| match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect())
    }
}
