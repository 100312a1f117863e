//! Alist-compatible storage service client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::config::StorageConfig;

use super::{OfflineDownloadRequest, RemoteEntry, StorageApi, StorageError};

/// Business code the service uses for success.
const CODE_OK: i64 = 200;
/// Business code the service uses for a rejected token.
const CODE_UNAUTHORIZED: i64 = 401;

/// Storage client speaking the Alist JSON API.
pub struct AlistClient {
    client: Client,
    config: StorageConfig,
}

impl AlistClient {
    /// Create a new client. Per-call timeouts come from the config.
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        let client = Client::builder().build().map_err(|e| {
            StorageError::ConnectionFailed(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self { client, config })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn timeout(secs: u32) -> Duration {
        Duration::from_secs(secs as u64)
    }

    /// POST a JSON body and unwrap the `{code, message, data}` envelope.
    async fn post<B, T>(
        &self,
        endpoint: &str,
        token: Option<&str>,
        body: &B,
        timeout: Duration,
    ) -> Result<Option<T>, StorageError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url(), endpoint);
        let mut request = self.client.post(&url).json(body).timeout(timeout);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, token);
        }

        let response = request.send().await.map_err(StorageError::from_reqwest)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(StorageError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                code: status.as_u16() as i64,
                message: body.chars().take(200).collect(),
            });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        envelope.into_result()
    }
}

#[async_trait]
impl StorageApi for AlistClient {
    fn name(&self) -> &str {
        "alist"
    }

    async fn login(&self, username: &str, password: &str) -> Result<String, StorageError> {
        debug!(url = %self.base_url(), username, "Logging in to storage service");

        let body = json!({ "username": username, "password": password });
        let data: Option<LoginData> = self
            .post(
                "/api/auth/login",
                None,
                &body,
                Self::timeout(self.config.login_timeout_secs),
            )
            .await
            .map_err(|e| match e {
                // No token was sent, so a 401 here means bad username/password.
                StorageError::Unauthorized => StorageError::Api {
                    code: CODE_UNAUTHORIZED,
                    message: "invalid username or password".to_string(),
                },
                other => other,
            })?;

        data.map(|d| d.token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| StorageError::InvalidResponse("login response carried no token".into()))
    }

    async fn list(
        &self,
        token: &str,
        path: &str,
        refresh: bool,
    ) -> Result<Vec<RemoteEntry>, StorageError> {
        let body = json!({
            "path": path,
            "page": 1,
            "per_page": 0,
            "refresh": refresh,
        });
        let data: Option<ListData> = self
            .post(
                "/api/fs/list",
                Some(token),
                &body,
                Self::timeout(self.config.list_timeout_secs),
            )
            .await?;

        // An empty directory is reported as `content: null`.
        let entries = data.and_then(|d| d.content).unwrap_or_default();
        debug!(path, entries = entries.len(), refresh, "Listed remote directory");
        Ok(entries)
    }

    async fn add_offline_download(
        &self,
        token: &str,
        request: &OfflineDownloadRequest,
    ) -> Result<(), StorageError> {
        debug!(path = %request.path, tool = %request.tool, "Adding offline download");
        let _: Option<serde_json::Value> = self
            .post(
                "/api/fs/add_offline_download",
                Some(token),
                request,
                Self::timeout(self.config.submit_timeout_secs),
            )
            .await?;
        Ok(())
    }

    async fn remove(&self, token: &str, dir: &str, names: &[String]) -> Result<(), StorageError> {
        if names.is_empty() {
            return Ok(());
        }
        let body = json!({ "dir": dir, "names": names });
        let result: Result<Option<serde_json::Value>, _> = self
            .post(
                "/api/fs/remove",
                Some(token),
                &body,
                Self::timeout(self.config.remove_timeout_secs),
            )
            .await;

        if let Err(e) = &result {
            warn!(dir, count = names.len(), error = %e, "Remote remove failed");
        }
        result.map(|_| ())
    }
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<Option<T>, StorageError> {
        match self.code {
            CODE_OK => Ok(self.data),
            CODE_UNAUTHORIZED => Err(StorageError::Unauthorized),
            code => Err(StorageError::Api {
                code,
                message: if self.message.is_empty() {
                    "unknown error".to_string()
                } else {
                    self.message
                },
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ListData {
    #[serde(default)]
    content: Option<Vec<RemoteEntry>>,
}
