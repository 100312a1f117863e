//! Bearer credential lifecycle for the storage service.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::metrics::STORAGE_LOGINS;

use super::{Session, StorageApi, StorageError};

/// How long a freshly issued token is trusted.
pub const CREDENTIAL_VALIDITY_HOURS: i64 = 24;

/// Login exchange failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Storage login failed: {0}")]
    LoginFailed(#[from] StorageError),
}

/// A bearer token and the instant it stops being trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Owns the single storage credential of the process.
///
/// Logins are serialized: concurrent callers that find the cache empty wait
/// for the first login instead of issuing their own.
pub struct CredentialCache {
    api: Arc<dyn StorageApi>,
    username: String,
    password: String,
    validity: Duration,
    current: Mutex<Option<Credential>>,
}

impl CredentialCache {
    pub fn new(api: Arc<dyn StorageApi>, username: String, password: String) -> Self {
        Self {
            api,
            username,
            password,
            validity: Duration::hours(CREDENTIAL_VALIDITY_HOURS),
            current: Mutex::new(None),
        }
    }

    pub fn api(&self) -> Arc<dyn StorageApi> {
        Arc::clone(&self.api)
    }

    /// Cached credential if unexpired, otherwise a fresh login.
    pub async fn get_valid(&self) -> Result<Credential, CredentialError> {
        self.get_valid_at(Utc::now()).await
    }

    /// Same as [`Self::get_valid`] with an explicit clock reading.
    pub async fn get_valid_at(&self, now: DateTime<Utc>) -> Result<Credential, CredentialError> {
        let mut current = self.current.lock().await;

        if let Some(credential) = current.as_ref() {
            if credential.is_valid(now) {
                debug!("Using cached storage credential");
                return Ok(credential.clone());
            }
            info!(expired_at = %credential.expires_at, "Storage credential expired");
            *current = None;
        }

        info!(backend = self.api.name(), "Logging in to storage service");
        let token = match self.api.login(&self.username, &self.password).await {
            Ok(token) => token,
            Err(e) => {
                STORAGE_LOGINS.with_label_values(&["failed"]).inc();
                warn!(error = %e, "Storage login failed");
                return Err(e.into());
            }
        };
        STORAGE_LOGINS.with_label_values(&["success"]).inc();

        let credential = Credential {
            token,
            expires_at: now + self.validity,
        };
        *current = Some(credential.clone());
        info!(expires_at = %credential.expires_at, "Storage credential cached");
        Ok(credential)
    }

    /// Drop the cached credential; the next caller logs in again.
    pub async fn invalidate(&self) {
        if self.current.lock().await.take().is_some() {
            info!("Storage credential invalidated");
        }
    }

    /// Drop the cached credential only if it still holds `token`.
    ///
    /// A caller rejected with an old token must not discard a credential
    /// another caller has since obtained.
    pub async fn invalidate_token(&self, token: &str) {
        let mut current = self.current.lock().await;
        match current.as_ref() {
            Some(credential) if credential.token == token => {
                *current = None;
                info!("Storage credential invalidated");
            }
            Some(_) => debug!("Rejected token already replaced, keeping cached credential"),
            None => {}
        }
    }

    /// Whether a credential is cached and still valid.
    pub async fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now()).await
    }

    /// Whether a credential is cached and still valid at `now`.
    pub async fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(|c| c.is_valid(now))
    }

    /// Validate (logging in if needed) and hand out a session.
    pub async fn session(self: &Arc<Self>) -> Result<Session, CredentialError> {
        self.get_valid().await?;
        Ok(Session::new(Arc::clone(self)))
    }
}

impl std::fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCache")
            .field("api", &self.api.name())
            .field("username", &self.username)
            .field("validity", &self.validity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockStorage;

    fn cache(storage: &Arc<MockStorage>) -> Arc<CredentialCache> {
        Arc::new(CredentialCache::new(
            Arc::clone(storage) as Arc<dyn StorageApi>,
            "admin".to_string(),
            "pw".to_string(),
        ))
    }

    #[test]
    fn test_credential_validity_window() {
        let now = Utc::now();
        let credential = Credential {
            token: "t".to_string(),
            expires_at: now + Duration::hours(1),
        };
        assert!(credential.is_valid(now));
        assert!(!credential.is_valid(now + Duration::hours(1)));
    }

    #[tokio::test]
    async fn test_reuses_credential_within_window() {
        let storage = Arc::new(MockStorage::new());
        let cache = cache(&storage);
        let now = Utc::now();

        let first = cache.get_valid_at(now).await.unwrap();
        let second = cache.get_valid_at(now + Duration::hours(23)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(storage.login_count().await, 1);
        assert_eq!(first.expires_at, now + Duration::hours(24));
    }

    #[tokio::test]
    async fn test_stale_token_rejection_keeps_newer_credential() {
        let storage = Arc::new(MockStorage::new());
        let cache = cache(&storage);

        let stale = cache.get_valid().await.unwrap();
        cache.invalidate().await;
        let fresh = cache.get_valid().await.unwrap();
        assert_ne!(stale.token, fresh.token);

        cache.invalidate_token(&stale.token).await;
        assert!(cache.is_valid().await);
        assert_eq!(cache.get_valid().await.unwrap(), fresh);
        assert_eq!(storage.login_count().await, 2);

        cache.invalidate_token(&fresh.token).await;
        assert!(!cache.is_valid().await);
    }

    #[tokio::test]
    async fn test_relogin_after_expiry() {
        let storage = Arc::new(MockStorage::new());
        let cache = cache(&storage);
        let now = Utc::now();

        let first = cache.get_valid_at(now).await.unwrap();
        let second = cache.get_valid_at(now + Duration::hours(24)).await.unwrap();

        assert_ne!(first.token, second.token);
        assert_eq!(storage.login_count().await, 2);
    }

    #[tokio::test]
    async fn test_relogin_after_invalidate() {
        let storage = Arc::new(MockStorage::new());
        let cache = cache(&storage);

        cache.get_valid().await.unwrap();
        cache.invalidate().await;
        assert!(!cache.is_valid_at(Utc::now()).await);

        cache.get_valid().await.unwrap();
        cache.get_valid().await.unwrap();
        assert_eq!(storage.login_count().await, 2);
    }

    #[tokio::test]
    async fn test_login_failure_is_surfaced_without_retry() {
        let storage = Arc::new(MockStorage::new());
        storage
            .set_login_error(StorageError::Api {
                code: 400,
                message: "password is incorrect".to_string(),
            })
            .await;
        let cache = cache(&storage);

        let result = cache.get_valid().await;
        assert!(matches!(
            result,
            Err(CredentialError::LoginFailed(StorageError::Api { code: 400, .. }))
        ));
        assert_eq!(storage.login_count().await, 1);
        assert!(!cache.is_valid_at(Utc::now()).await);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_login() {
        let storage = Arc::new(MockStorage::new());
        let cache = cache(&storage);

        let (a, b) = tokio::join!(cache.get_valid(), cache.get_valid());
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(storage.login_count().await, 1);
    }
}
