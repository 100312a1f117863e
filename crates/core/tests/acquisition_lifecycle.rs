//! Acquisition lifecycle integration tests.
//!
//! These tests drive whole batches through the public API:
//! input lines -> search/select -> offline download -> refresh

use std::sync::{Arc, Mutex};

use futures::StreamExt;

use stashbot_core::{
    batch::BatchProgress,
    classify_lines,
    config::BatchConfig,
    testing::{fixtures, MockSearcher, MockStorage},
    BatchCoordinator, CredentialCache, ItemStatus, MagnetSearcher, ProgressCallback,
    RefreshOutcome, StorageError, Submitter,
};

/// Test helper wiring mocks the way the server does.
struct TestHarness {
    storage: Arc<MockStorage>,
    searcher: Arc<MockSearcher>,
    credentials: Arc<CredentialCache>,
    coordinator: BatchCoordinator,
}

impl TestHarness {
    async fn new() -> Self {
        let storage = Arc::new(MockStorage::new());
        storage.add_dir("/dl").await;
        let searcher = Arc::new(MockSearcher::new());
        let credentials = fixtures::credential_cache(&storage);

        let submitter = Submitter::new(Arc::clone(&searcher) as Arc<dyn MagnetSearcher>, "/dl");
        let coordinator = BatchCoordinator::new(
            Arc::new(submitter),
            BatchConfig {
                item_delay_ms: 0,
                refresh_delay_ms: 0,
                summary_limit: 10,
            },
        );

        Self {
            storage,
            searcher,
            credentials,
            coordinator,
        }
    }

    async fn add_code(&self, code: &str, releases: &[(&str, &str)]) {
        let records = releases
            .iter()
            .enumerate()
            .map(|(i, (hash, size))| {
                fixtures::record(
                    &fixtures::magnet(hash),
                    &format!("{} #{}", code, i),
                    size,
                    "2024-05-01",
                )
            })
            .collect();
        self.searcher.set_records(code, records).await;
    }

    fn lines(text: &str) -> Vec<String> {
        classify_lines(text)
            .into_iter()
            .map(|kind| kind.raw().to_string())
            .collect()
    }
}

#[tokio::test]
async fn test_mixed_message_is_processed_in_order() {
    let harness = TestHarness::new().await;
    harness
        .add_code("SONE-622", &[("big", "7.5GB"), ("best", "5.8GB"), ("sd", "1.2GB")])
        .await;

    let text = format!(
        "SONE-622\n\n{}\nnot a code\nABP-404\n",
        fixtures::magnet("direct")
    );
    let session = harness.credentials.session().await.unwrap();
    let report = harness
        .coordinator
        .run(&session, TestHarness::lines(&text), None)
        .await;

    let statuses: Vec<_> = report.items.iter().map(|i| i.status).collect();
    assert_eq!(
        statuses,
        vec![
            ItemStatus::Succeeded,
            ItemStatus::Succeeded,
            ItemStatus::Failed,
            ItemStatus::NotFound,
        ]
    );

    let submitted: Vec<_> = harness
        .storage
        .submissions()
        .await
        .into_iter()
        .map(|s| s.request.urls[0].clone())
        .collect();
    assert_eq!(
        submitted,
        vec![fixtures::magnet("best"), fixtures::magnet("direct")]
    );
    assert_eq!(
        harness.searcher.recorded_searches().await,
        vec!["SONE-622".to_string(), "ABP-404".to_string()]
    );
    assert!(matches!(report.refresh, RefreshOutcome::Refreshed { .. }));
    assert_eq!(harness.storage.login_count().await, 1);
}

#[tokio::test]
async fn test_revoked_token_mid_batch_relogs_once() {
    let harness = TestHarness::new().await;
    let session = harness.credentials.session().await.unwrap();

    let inputs = vec![
        fixtures::magnet("one"),
        fixtures::magnet("two"),
        fixtures::magnet("three"),
    ];
    let stream = harness.coordinator.items(&session, inputs);
    futures::pin_mut!(stream);

    let first = stream.next().await.unwrap();
    assert_eq!(first.status, ItemStatus::Succeeded);

    // Expire the token server-side between items.
    harness.storage.revoke_tokens().await;

    // The next call hits the 401 and fails; the one after logs in again.
    let second = stream.next().await.unwrap();
    assert_eq!(second.status, ItemStatus::Failed);
    assert!(second.message.contains("rejected"));

    let third = stream.next().await.unwrap();
    assert_eq!(third.status, ItemStatus::Succeeded);
    assert!(stream.next().await.is_none());

    assert_eq!(harness.storage.login_count().await, 2);
    assert_eq!(harness.storage.submissions().await.len(), 2);
}

#[tokio::test]
async fn test_progress_reports_running_tallies() {
    let harness = TestHarness::new().await;
    harness.add_code("ABP-123", &[("abp", "3GB")]).await;
    let session = harness.credentials.session().await.unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: ProgressCallback = Arc::new(move |p: &BatchProgress| {
        sink.lock()
            .unwrap()
            .push((p.position, p.total, p.succeeded, p.failed));
    });

    let inputs = TestHarness::lines("ABP-123
XYZ-999
magnet:?xt=urn:btih:zzz");
    harness.coordinator.run(&session, inputs, Some(callback)).await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(1, 3, 1, 0), (2, 3, 1, 1), (3, 3, 2, 1)]
    );
}

#[tokio::test]
async fn test_twelve_item_batch_summary() {
    let harness = TestHarness::new().await;
    harness
        .storage
        .set_next_error(StorageError::ConnectionFailed("reset".into()))
        .await;
    let session = harness.credentials.session().await.unwrap();

    let inputs = (0..12).map(|n| fixtures::magnet(&format!("h{}", n))).collect();
    let report = harness.coordinator.run(&session, inputs, None).await;
    let summary = report.summary(harness.coordinator.config().summary_limit);

    assert_eq!(summary.total, 12);
    assert_eq!(summary.shown.len(), 10);
    assert_eq!(summary.elided, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 11);
    assert_eq!(summary.shown[0].status, ItemStatus::Failed);
}
