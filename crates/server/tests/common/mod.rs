//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that builds the full router in
//! process with a mock storage service and a mock magnet search injected,
//! so the HTTP surface can be driven without any external infrastructure.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use stashbot_core::{
    create_authenticator,
    testing::{MockSearcher, MockStorage},
    AuthMethod, Authenticator, BatchCoordinator, CleanupService, CredentialCache, MagnetSearcher,
    Submitter,
};
use stashbot_server::state::AppState;

/// Re-export fixtures for test convenience
pub use stashbot_core::testing::fixtures;

/// Offline directory every fixture points at.
pub const OFFLINE_DIR: &str = "/dl";

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_submit_magnet() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture
///         .post("/api/v1/messages", json!({ "text": fixtures::magnet("abc") }))
///         .await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock storage service - seed the remote tree, inject failures
    pub storage: Arc<MockStorage>,
    /// Mock magnet search - configure records per code
    pub searcher: Arc<MockSearcher>,
    /// The credential cache the router logs in through
    pub credentials: Arc<CredentialCache>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Knobs for [`TestFixture::with_config`].
#[derive(Debug, Default)]
pub struct TestConfig {
    /// Switches auth to the allow-list when set.
    pub allowed_user_ids: Option<Vec<i64>>,
    pub small_file_threshold_bytes: u64,
    pub summary_limit: Option<usize>,
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let mut config = fixtures::config();
        config.storage.offline_dir = OFFLINE_DIR.to_string();
        config.cleanup.small_file_threshold_bytes = test_config.small_file_threshold_bytes;
        if let Some(ids) = test_config.allowed_user_ids {
            config.auth.method = AuthMethod::AllowList;
            config.auth.allowed_user_ids = ids;
        }
        if let Some(limit) = test_config.summary_limit {
            config.batch.summary_limit = limit;
        }

        // Create mocks
        let storage = Arc::new(MockStorage::new());
        storage.add_dir(OFFLINE_DIR).await;
        let searcher = Arc::new(MockSearcher::new());
        let credentials = fixtures::credential_cache(&storage);

        let submitter = Arc::new(Submitter::new(
            Arc::clone(&searcher) as Arc<dyn MagnetSearcher>,
            OFFLINE_DIR,
        ));
        let coordinator = Arc::new(BatchCoordinator::new(submitter, config.batch.clone()));
        let cleanup = Arc::new(CleanupService::from_config(&config.cleanup));
        let authenticator: Arc<dyn Authenticator> = Arc::from(
            create_authenticator(&config.auth).expect("Failed to create authenticator"),
        );

        let state = Arc::new(AppState::new(
            config,
            authenticator,
            Arc::clone(&credentials),
            coordinator,
            cleanup,
            None,
        ));

        let router = stashbot_server::api::create_router(state);

        Self {
            router,
            storage,
            searcher,
            credentials,
        }
    }

    /// Seed the search results for `code`, one record per `(hash, size)`.
    pub async fn add_code(&self, code: &str, releases: &[(&str, &str)]) {
        let records = releases
            .iter()
            .map(|(hash, size)| {
                fixtures::record(
                    &fixtures::magnet(hash),
                    &format!("{} {}", code, hash),
                    size,
                    "2024-05-01",
                )
            })
            .collect();
        self.searcher.set_records(code, records).await;
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, None, Some(body)).await
    }

    /// Send a POST request on behalf of a chat user.
    pub async fn post_as(&self, user_id: &str, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(user_id), Some(body)).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a request to the test server.
    async fn request(
        &self,
        method: &str,
        path: &str,
        user_id: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);
        if let Some(id) = user_id {
            request_builder = request_builder.header("X-User-Id", id);
        }

        let request = match body {
            Some(json) => request_builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => request_builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
