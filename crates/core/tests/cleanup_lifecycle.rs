//! Cleanup lifecycle integration tests.
//!
//! A finished download is cleaned for its code, then the offline directory
//! is swept for small files and left-over empty directories.

use std::sync::Arc;

use stashbot_core::{
    cleanup::plan_ad_cleanup,
    config::CleanupConfig,
    testing::{fixtures, MockStorage},
    CleanupService, RemoteTree, Session, StorageError,
};

const MB: u64 = 1024 * 1024;
const GB: u64 = 1024 * MB;

/// Offline directory after two downloads finished.
async fn downloaded_tree() -> (Arc<MockStorage>, Session) {
    let (storage, session) = fixtures::storage_session().await;

    storage.add_file("/dl/SONE-622/SONE-622.mp4", 5 * GB).await;
    storage.add_file("/dl/SONE-622/SONE-622 最新地址.mp4", 40 * MB).await;
    storage.add_file("/dl/SONE-622/996gg.cc 情报.jpg", 200_000).await;
    storage.add_file("/dl/SONE-622/read me.txt", 1_000).await;
    storage.add_file("/dl/SONE-622/promo/直播聚合.mp4", 80 * MB).await;
    storage.add_file("/dl/SONE-622.FHD/sone622-C.mkv", 6 * GB).await;
    storage.add_file("/dl/SONE-622.FHD/安装.apk", 5 * MB).await;
    storage.add_file("/dl/ABP-123/ABP-123.mp4", 3 * GB).await;
    storage.add_file("/dl/ABP-123/sample/ABP-123-sample.mp4", 20 * MB).await;
    storage.add_dir("/dl/stale/empty").await;

    (storage, session)
}

fn service(threshold_config: &CleanupConfig) -> CleanupService {
    CleanupService::from_config(threshold_config)
}

#[tokio::test]
async fn test_code_cleanup_then_sweep() {
    let (storage, session) = downloaded_tree().await;
    let service = service(&CleanupConfig::default());

    let report = service.clean_code(&session, "/dl", "SONE-622").await.unwrap();
    assert_eq!(report.directories.len(), 2);
    assert_eq!(report.deleted(), 4);
    assert_eq!(report.failed(), 0);

    // Main media of both matches survives, including the one carrying an
    // ad keyword.
    assert!(storage.exists("/dl/SONE-622/SONE-622.mp4").await);
    assert!(storage.exists("/dl/SONE-622/SONE-622 最新地址.mp4").await);
    assert!(storage.exists("/dl/SONE-622.FHD/sone622-C.mkv").await);
    assert!(!storage.exists("/dl/SONE-622.FHD/安装.apk").await);
    assert!(!storage.exists("/dl/SONE-622/promo/直播聚合.mp4").await);
    // Other releases are untouched.
    assert!(storage.exists("/dl/ABP-123/sample/ABP-123-sample.mp4").await);

    let sweep = service
        .sweep_small_files(&session, "/dl", 100 * MB)
        .await
        .unwrap();
    assert_eq!(sweep.deleted, 2);
    assert_eq!(sweep.empty_dirs_removed, 4);
    assert!(!sweep.is_partial_failure());

    assert_eq!(
        storage.paths().await,
        vec![
            "/dl",
            "/dl/ABP-123",
            "/dl/ABP-123/ABP-123.mp4",
            "/dl/SONE-622",
            "/dl/SONE-622.FHD",
            "/dl/SONE-622.FHD/sone622-C.mkv",
            "/dl/SONE-622/SONE-622.mp4",
        ]
    );
}

#[tokio::test]
async fn test_cleanup_is_idempotent() {
    let (storage, session) = downloaded_tree().await;
    let service = service(&CleanupConfig::default());

    let snapshot = RemoteTree::scan(&session, "/dl/SONE-622").await.unwrap();
    let first = plan_ad_cleanup(&snapshot, "SONE-622", service.rules());
    let second = plan_ad_cleanup(&snapshot, "SONE-622", service.rules());
    assert_eq!(first, second);

    service.clean_code(&session, "/dl", "SONE-622").await.unwrap();
    let removals = storage.removals().await.len();

    let again = service.clean_code(&session, "/dl", "SONE-622").await.unwrap();
    assert_eq!(again.deleted(), 0);
    assert_eq!(storage.removals().await.len(), removals);
}

#[tokio::test]
async fn test_sweep_skips_unlistable_subtree() {
    let (storage, session) = downloaded_tree().await;
    storage
        .fail_listing("/dl/ABP-123/sample", StorageError::Timeout)
        .await;
    let service = service(&CleanupConfig::default());

    let sweep = service
        .sweep_small_files(&session, "/dl", 100 * MB)
        .await
        .unwrap();

    assert_eq!(sweep.scan_failures, 1);
    assert!(sweep.is_partial_failure());
    // Neither the unlisted directory nor its parent is treated as empty.
    assert!(storage.exists("/dl/ABP-123/sample/ABP-123-sample.mp4").await);
    assert!(storage.exists("/dl/ABP-123/sample").await);
    assert!(!storage.exists("/dl/stale").await);
}

#[tokio::test]
async fn test_partial_failure_keeps_going() {
    let (storage, session) = downloaded_tree().await;
    storage
        .fail_removal(
            "/dl/SONE-622",
            StorageError::Api {
                code: 403,
                message: "permission denied".to_string(),
            },
        )
        .await;
    let service = service(&CleanupConfig {
        failure_detail_limit: 1,
        ..CleanupConfig::default()
    });

    let report = service.clean_code(&session, "/dl", "SONE-622").await.unwrap();
    let first = &report.directories[0];
    assert_eq!(first.root, "/dl/SONE-622");
    assert_eq!(first.failed, 2);
    assert_eq!(first.failures.details.len(), 1);
    assert_eq!(first.failures.elided, 1);
    // The second directory is still cleaned.
    assert_eq!(report.directories[1].deleted, 1);
    assert!(!storage.exists("/dl/SONE-622.FHD/安装.apk").await);
}
