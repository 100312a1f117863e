//! Authenticated handle for storage operations.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::metrics::STORAGE_CALLS;

use super::{CredentialCache, CredentialError, OfflineDownloadRequest, RemoteEntry, StorageError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Whether the storage service rejected the credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SessionError::Storage(StorageError::Unauthorized))
    }
}

/// Capability to call the storage service.
///
/// Every call fetches a valid credential from the shared cache first. A 401
/// from the service drops the cached credential so the next call logs in
/// again; the failing call itself is not retried.
#[derive(Clone)]
pub struct Session {
    credentials: Arc<CredentialCache>,
}

impl Session {
    pub(crate) fn new(credentials: Arc<CredentialCache>) -> Self {
        Self { credentials }
    }

    pub fn credentials(&self) -> &Arc<CredentialCache> {
        &self.credentials
    }

    /// List `path` from the service cache.
    pub async fn list(&self, path: &str) -> Result<Vec<RemoteEntry>, SessionError> {
        let api = self.credentials.api();
        self.call("list", |token| async move { api.list(&token, path, false).await })
            .await
    }

    /// List `path`, forcing the service to re-read the backing storage.
    pub async fn refresh(&self, path: &str) -> Result<Vec<RemoteEntry>, SessionError> {
        let api = self.credentials.api();
        self.call("refresh", |token| async move { api.list(&token, path, true).await })
            .await
    }

    /// Queue one magnet for offline download into `dir`.
    pub async fn submit_magnet(&self, dir: &str, magnet_uri: &str) -> Result<(), SessionError> {
        let api = self.credentials.api();
        let request = OfflineDownloadRequest::magnet(dir, magnet_uri);
        self.call("add_offline_download", |token| async move {
            api.add_offline_download(&token, &request).await
        })
        .await
    }

    /// Remove `names` from `dir` in a single call.
    pub async fn remove(&self, dir: &str, names: &[String]) -> Result<(), SessionError> {
        let api = self.credentials.api();
        self.call("remove", |token| async move { api.remove(&token, dir, names).await })
            .await
    }

    async fn call<T, F, Fut>(&self, op: &'static str, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        let credential = self.credentials.get_valid().await?;
        let result = f(credential.token.clone()).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(StorageError::Unauthorized) => "unauthorized",
            Err(_) => "failed",
        };
        STORAGE_CALLS.with_label_values(&[op, outcome]).inc();

        match result {
            Err(StorageError::Unauthorized) => {
                warn!(op, "Storage rejected credential, invalidating");
                self.credentials.invalidate_token(&credential.token).await;
                Err(StorageError::Unauthorized.into())
            }
            other => other.map_err(Into::into),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}
