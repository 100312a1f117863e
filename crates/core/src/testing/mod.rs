//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides mock implementations of the external service traits,
//! allowing end-to-end tests of acquisition and cleanup without a real
//! storage or search service.
//!
//! # Example
//!
//! ```rust,ignore
//! use stashbot_core::testing::{fixtures, MockSearcher, MockStorage};
//!
//! let storage = MockStorage::new();
//! storage.add_file("/dl/ABP-123/ABP-123.mp4", 4 << 30).await;
//!
//! let searcher = MockSearcher::new();
//! searcher.set_records("ABP-123", vec![/* records */]).await;
//! ```

mod mock_searcher;
mod mock_storage;

pub use mock_searcher::MockSearcher;
pub use mock_storage::{MockStorage, RecordedRemoval, RecordedSubmission};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;

    use super::MockStorage;
    use crate::config::{load_config_from_str, Config};
    use crate::storage::{CredentialCache, Session, StorageApi};

    /// A magnet URI with a predictable info hash.
    pub fn magnet(hash: &str) -> String {
        format!("magnet:?xt=urn:btih:{}", hash)
    }

    /// A search record in the single-quoted list form the search service
    /// returns.
    pub fn record(magnet: &str, name: &str, size: &str, date: &str) -> String {
        format!("['{}', '{}', '{}', '{}']", magnet, name, size, date)
    }

    /// Minimal valid configuration pointing at `/dl`.
    pub fn config() -> Config {
        let toml = r#"
[storage]
url = "http://storage.test"
username = "admin"
password = "secret"
offline_dir = "/dl"

[search]
url = "http://search.test/code"

[batch]
item_delay_ms = 0
refresh_delay_ms = 0
"#;
        match load_config_from_str(toml) {
            Ok(config) => config,
            Err(e) => panic!("fixture config is invalid: {}", e),
        }
    }

    /// Credential cache backed by `storage`.
    pub fn credential_cache(storage: &Arc<MockStorage>) -> Arc<CredentialCache> {
        Arc::new(CredentialCache::new(
            Arc::clone(storage) as Arc<dyn StorageApi>,
            "admin".to_string(),
            "secret".to_string(),
        ))
    }

    /// A mock storage and a logged-in session on it.
    pub async fn storage_session() -> (Arc<MockStorage>, Session) {
        let storage = Arc::new(MockStorage::new());
        let session = match credential_cache(&storage).session().await {
            Ok(session) => session,
            Err(e) => panic!("mock login failed: {}", e),
        };
        (storage, session)
    }
}
