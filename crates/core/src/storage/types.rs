//! Types for the remote storage service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by a single call to the storage service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    /// The bearer credential was rejected (HTTP 401 or business code 401).
    #[error("Storage credential rejected")]
    Unauthorized,

    /// Non-success business code; the remote message is passed through.
    #[error("Storage API error (code {code}): {message}")]
    Api { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl StorageError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StorageError::Timeout
        } else if e.is_connect() {
            StorageError::ConnectionFailed(e.to_string())
        } else {
            StorageError::InvalidResponse(e.to_string())
        }
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub size: u64,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: 0,
        }
    }
}

/// Offline download job submitted to the storage service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfflineDownloadRequest {
    /// Destination directory.
    pub path: String,
    pub urls: Vec<String>,
    pub tool: String,
    pub delete_policy: String,
}

impl OfflineDownloadRequest {
    /// Queue one magnet with the storage-side downloader, deleting the
    /// temporary copy once the upload succeeded.
    pub fn magnet(dir: &str, magnet_uri: &str) -> Self {
        Self {
            path: dir.to_string(),
            urls: vec![magnet_uri.to_string()],
            tool: "storage".to_string(),
            delete_policy: "delete_on_upload_succeed".to_string(),
        }
    }
}

/// Raw calls of the storage service. Tokens are supplied by the caller;
/// lifecycle is handled by [`super::CredentialCache`].
#[async_trait]
pub trait StorageApi: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Exchange username/password for a bearer token.
    async fn login(&self, username: &str, password: &str) -> Result<String, StorageError>;

    /// List every entry of `path` in one call. `refresh` asks the service to
    /// re-read the underlying storage instead of serving its cache.
    async fn list(
        &self,
        token: &str,
        path: &str,
        refresh: bool,
    ) -> Result<Vec<RemoteEntry>, StorageError>;

    /// Queue an offline download.
    async fn add_offline_download(
        &self,
        token: &str,
        request: &OfflineDownloadRequest,
    ) -> Result<(), StorageError>;

    /// Remove `names` (files or directories) from `dir`.
    async fn remove(&self, token: &str, dir: &str, names: &[String]) -> Result<(), StorageError>;
}

/// Join a directory path and an entry name.
pub fn join_path(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name)
}

/// Split a path into its parent directory and final component.
pub fn split_path(path: &str) -> (String, String) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => ("/".to_string(), trimmed[1..].to_string()),
        Some(idx) => (trimmed[..idx].to_string(), trimmed[idx + 1..].to_string()),
        None => (String::new(), trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/downloads", "a.mp4"), "/downloads/a.mp4");
        assert_eq!(join_path("/downloads/", "a.mp4"), "/downloads/a.mp4");
        assert_eq!(join_path("/", "downloads"), "/downloads");
    }

    #[test]
    fn test_split_path() {
        assert_eq!(
            split_path("/downloads/SONE-622/a.mp4"),
            ("/downloads/SONE-622".to_string(), "a.mp4".to_string())
        );
        assert_eq!(
            split_path("/downloads"),
            ("/".to_string(), "downloads".to_string())
        );
        assert_eq!(
            split_path("/downloads/x/"),
            ("/downloads".to_string(), "x".to_string())
        );
    }

    #[test]
    fn test_offline_download_request_body() {
        let request = OfflineDownloadRequest::magnet("/downloads", "magnet:?xt=urn:btih:abc");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["path"], "/downloads");
        assert_eq!(json["urls"][0], "magnet:?xt=urn:btih:abc");
        assert_eq!(json["tool"], "storage");
        assert_eq!(json["delete_policy"], "delete_on_upload_succeed");
    }

    #[test]
    fn test_remote_entry_defaults() {
        let entry: RemoteEntry = serde_json::from_str(r#"{"name": "x"}"#).unwrap();
        assert!(!entry.is_dir);
        assert_eq!(entry.size, 0);
    }
}
