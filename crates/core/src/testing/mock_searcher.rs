//! Mock searcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::search::{MagnetSearcher, SearchError};

/// Mock implementation of the MagnetSearcher trait.
///
/// Returns canned records per catalog code (empty for unknown codes),
/// records every searched code and can fail on demand.
///
/// # Example
///
/// ```rust,ignore
/// use stashbot_core::testing::{fixtures, MockSearcher};
///
/// let searcher = MockSearcher::new();
/// searcher
///     .set_records("ABP-123", vec![fixtures::record(&fixtures::magnet("a"), "ABP-123", "4GB", "2024-01-01")])
///     .await;
///
/// let records = searcher.search("ABP-123").await?;
/// assert_eq!(records.len(), 1);
/// assert_eq!(searcher.recorded_searches().await, vec!["ABP-123"]);
/// ```
#[derive(Debug, Default)]
pub struct MockSearcher {
    /// Canned records by code.
    records: Arc<RwLock<HashMap<String, Vec<String>>>>,
    /// Recorded searched codes.
    searches: Arc<RwLock<Vec<String>>>,
    /// If set, the next search will fail with this error.
    next_error: Arc<RwLock<Option<SearchError>>>,
    /// Codes that always fail.
    code_errors: Arc<RwLock<HashMap<String, SearchError>>>,
}

impl MockSearcher {
    /// Create a new mock searcher with no results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the records returned for `code`.
    pub async fn set_records(&self, code: &str, records: Vec<String>) {
        self.records.write().await.insert(code.to_string(), records);
    }

    /// Get the codes searched so far, in order.
    pub async fn recorded_searches(&self) -> Vec<String> {
        self.searches.read().await.clone()
    }

    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    /// Configure the next search to fail with the given error.
    pub async fn set_next_error(&self, error: SearchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every search for `code` fail.
    pub async fn fail_code(&self, code: &str, error: SearchError) {
        self.code_errors
            .write()
            .await
            .insert(code.to_string(), error);
    }
}

#[async_trait]
impl MagnetSearcher for MockSearcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, code: &str) -> Result<Vec<String>, SearchError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        self.searches.write().await.push(code.to_string());

        if let Some(err) = self.code_errors.read().await.get(code) {
            return Err(err.clone());
        }

        Ok(self
            .records
            .read()
            .await
            .get(code)
            .cloned()
            .unwrap_or_default())
    }
}
