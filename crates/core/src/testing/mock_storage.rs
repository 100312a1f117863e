//! Mock storage service for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{
    join_path, split_path, OfflineDownloadRequest, RemoteEntry, StorageApi, StorageError,
};

/// A recorded offline download for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSubmission {
    pub request: OfflineDownloadRequest,
    pub token: String,
    pub timestamp: chrono::DateTime<Utc>,
}

/// A recorded remove call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRemoval {
    pub dir: String,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
struct MockEntry {
    is_dir: bool,
    size: u64,
}

/// Mock implementation of the StorageApi trait.
///
/// Holds an in-memory directory tree and provides controllable behavior:
/// - Count logins and track issued tokens
/// - Revoke tokens to simulate server-side expiry (401 on next call)
/// - Fail listings or removals for specific paths
/// - Record submissions and removals for assertions
///
/// # Example
///
/// ```rust,ignore
/// let storage = MockStorage::new();
/// storage.add_file("/dl/ABP-123/ABP-123.mp4", 4 << 30).await;
/// storage.add_file("/dl/ABP-123/ad.txt", 12).await;
///
/// // ... run a cleanup ...
///
/// assert!(!storage.exists("/dl/ABP-123/ad.txt").await);
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    entries: Arc<RwLock<BTreeMap<String, MockEntry>>>,
    logins: Arc<RwLock<u32>>,
    tokens: Arc<RwLock<HashSet<String>>>,
    login_error: Arc<RwLock<Option<StorageError>>>,
    /// If set, the next non-login operation fails with this error.
    next_error: Arc<RwLock<Option<StorageError>>>,
    list_failures: Arc<RwLock<HashMap<String, StorageError>>>,
    remove_failures: Arc<RwLock<HashMap<String, StorageError>>>,
    refreshes: Arc<RwLock<u32>>,
    submissions: Arc<RwLock<Vec<RecordedSubmission>>>,
    removals: Arc<RwLock<Vec<RecordedRemoval>>>,
}

fn normalize(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn not_found() -> StorageError {
    StorageError::Api {
        code: 500,
        message: "object not found".to_string(),
    }
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating its parent directories.
    pub async fn add_file(&self, path: &str, size: u64) {
        let path = normalize(path);
        let mut entries = self.entries.write().await;
        Self::insert_parents(&mut entries, &path);
        entries.insert(path, MockEntry { is_dir: false, size });
    }

    /// Add a directory and its parents.
    pub async fn add_dir(&self, path: &str) {
        let path = normalize(path);
        let mut entries = self.entries.write().await;
        Self::insert_parents(&mut entries, &path);
        entries.insert(path, MockEntry { is_dir: true, size: 0 });
    }

    fn insert_parents(entries: &mut BTreeMap<String, MockEntry>, path: &str) {
        let (mut parent, _) = split_path(path);
        while !parent.is_empty() && parent != "/" {
            entries.insert(parent.clone(), MockEntry { is_dir: true, size: 0 });
            parent = split_path(&parent).0;
        }
    }

    pub async fn exists(&self, path: &str) -> bool {
        self.entries.read().await.contains_key(&normalize(path))
    }

    /// Every path currently stored, sorted.
    pub async fn paths(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    pub async fn login_count(&self) -> u32 {
        *self.logins.read().await
    }

    /// Make every login fail until cleared.
    pub async fn set_login_error(&self, error: StorageError) {
        *self.login_error.write().await = Some(error);
    }

    pub async fn clear_login_error(&self) {
        *self.login_error.write().await = None;
    }

    /// Reject every token issued so far.
    pub async fn revoke_tokens(&self) {
        self.tokens.write().await.clear();
    }

    /// Configure the next non-login operation to fail with the given error.
    pub async fn set_next_error(&self, error: StorageError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every listing of `path` fail.
    pub async fn fail_listing(&self, path: &str, error: StorageError) {
        self.list_failures.write().await.insert(normalize(path), error);
    }

    /// Make every remove call targeting `dir` fail.
    pub async fn fail_removal(&self, dir: &str, error: StorageError) {
        self.remove_failures.write().await.insert(normalize(dir), error);
    }

    pub async fn refresh_count(&self) -> u32 {
        *self.refreshes.read().await
    }

    pub async fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.read().await.clone()
    }

    pub async fn removals(&self) -> Vec<RecordedRemoval> {
        self.removals.read().await.clone()
    }

    async fn check_call(&self, token: &str) -> Result<(), StorageError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if !self.tokens.read().await.contains(token) {
            return Err(StorageError::Unauthorized);
        }
        Ok(())
    }
}

#[async_trait]
impl StorageApi for MockStorage {
    fn name(&self) -> &str {
        "mock"
    }

    async fn login(&self, _username: &str, _password: &str) -> Result<String, StorageError> {
        let mut logins = self.logins.write().await;
        *logins += 1;
        if let Some(err) = self.login_error.read().await.clone() {
            return Err(err);
        }

        let token = format!("mock-token-{}", *logins);
        self.tokens.write().await.insert(token.clone());
        Ok(token)
    }

    async fn list(
        &self,
        token: &str,
        path: &str,
        refresh: bool,
    ) -> Result<Vec<RemoteEntry>, StorageError> {
        self.check_call(token).await?;
        let path = normalize(path);
        if let Some(err) = self.list_failures.read().await.get(&path) {
            return Err(err.clone());
        }
        if refresh {
            *self.refreshes.write().await += 1;
        }

        let entries = self.entries.read().await;
        if path != "/" && !entries.get(&path).is_some_and(|e| e.is_dir) {
            return Err(not_found());
        }

        Ok(entries
            .iter()
            .filter(|(p, _)| p.as_str() != path && split_path(p).0 == path)
            .map(|(p, e)| RemoteEntry {
                name: split_path(p).1,
                is_dir: e.is_dir,
                size: e.size,
            })
            .collect())
    }

    async fn add_offline_download(
        &self,
        token: &str,
        request: &OfflineDownloadRequest,
    ) -> Result<(), StorageError> {
        self.check_call(token).await?;
        self.submissions.write().await.push(RecordedSubmission {
            request: request.clone(),
            token: token.to_string(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn remove(&self, token: &str, dir: &str, names: &[String]) -> Result<(), StorageError> {
        self.check_call(token).await?;
        let dir = normalize(dir);
        if let Some(err) = self.remove_failures.read().await.get(&dir) {
            return Err(err.clone());
        }

        self.removals.write().await.push(RecordedRemoval {
            dir: dir.clone(),
            names: names.to_vec(),
        });

        let mut entries = self.entries.write().await;
        for name in names {
            let target = join_path(&dir, name);
            let prefix = format!("{}/", target);
            entries.retain(|p, _| p != &target && !p.starts_with(&prefix));
        }
        Ok(())
    }
}
