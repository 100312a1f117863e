//! Scheduled small-file sweep of the offline download directory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::cleanup::{CleanupReport, CleanupService};
use crate::metrics::SCHEDULED_SWEEPS;
use crate::storage::{CredentialCache, SessionError};

/// Result of the most recent scheduled sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepRecord {
    pub finished_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<CleanupReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceStatus {
    pub running: bool,
    pub interval_secs: u64,
    pub runs: u64,
    pub last: Option<SweepRecord>,
}

/// Periodically sweeps `root` for files below the size threshold.
pub struct MaintenanceScheduler {
    credentials: Arc<CredentialCache>,
    cleanup: Arc<CleanupService>,
    root: String,
    threshold_bytes: u64,
    interval: Duration,

    // Runtime state
    running: Arc<AtomicBool>,
    runs: Arc<RwLock<u64>>,
    last: Arc<RwLock<Option<SweepRecord>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl MaintenanceScheduler {
    pub fn new(
        credentials: Arc<CredentialCache>,
        cleanup: Arc<CleanupService>,
        root: impl Into<String>,
        threshold_bytes: u64,
        interval: Duration,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            credentials,
            cleanup,
            root: root.into(),
            threshold_bytes,
            interval,
            running: Arc::new(AtomicBool::new(false)),
            runs: Arc::new(RwLock::new(0)),
            last: Arc::new(RwLock::new(None)),
            shutdown_tx,
        }
    }

    /// Whether both the interval and the threshold are non-zero.
    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero() && self.threshold_bytes > 0
    }

    /// Start the sweep loop. Returns false if disabled or already running.
    pub fn start(&self) -> bool {
        if !self.is_enabled() {
            info!("Scheduled maintenance disabled");
            return false;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Maintenance scheduler already running");
            return false;
        }

        let running = Arc::clone(&self.running);
        let credentials = Arc::clone(&self.credentials);
        let cleanup = Arc::clone(&self.cleanup);
        let runs = Arc::clone(&self.runs);
        let last = Arc::clone(&self.last);
        let root = self.root.clone();
        let threshold = self.threshold_bytes;
        let interval = self.interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!(root = %root, interval_secs = interval.as_secs(), "Maintenance loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Maintenance loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        // Failures are logged and recorded inside sweep.
                        if let Ok(report) =
                            Self::sweep(&credentials, &cleanup, &root, threshold, &runs, &last)
                                .await
                        {
                            debug!(deleted = report.deleted, "Scheduled sweep completed");
                        }
                    }
                }
            }
            info!("Maintenance loop stopped");
        });
        true
    }

    /// Stop the sweep loop. A sweep in progress finishes first.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("Stopping maintenance scheduler");
        let _ = self.shutdown_tx.send(());
    }

    /// Sweep once now, outside the schedule.
    pub async fn run_once(&self) -> Result<CleanupReport, SessionError> {
        Self::sweep(
            &self.credentials,
            &self.cleanup,
            &self.root,
            self.threshold_bytes,
            &self.runs,
            &self.last,
        )
        .await
    }

    pub async fn status(&self) -> MaintenanceStatus {
        MaintenanceStatus {
            running: self.running.load(Ordering::Relaxed),
            interval_secs: self.interval.as_secs(),
            runs: *self.runs.read().await,
            last: self.last.read().await.clone(),
        }
    }

    async fn sweep(
        credentials: &Arc<CredentialCache>,
        cleanup: &CleanupService,
        root: &str,
        threshold: u64,
        runs: &RwLock<u64>,
        last: &RwLock<Option<SweepRecord>>,
    ) -> Result<CleanupReport, SessionError> {
        let result: Result<CleanupReport, SessionError> = async {
            let session = credentials.session().await?;
            cleanup.sweep_small_files(&session, root, threshold).await
        }
        .await;

        *runs.write().await += 1;
        let record = match &result {
            Ok(report) => {
                SCHEDULED_SWEEPS.with_label_values(&["success"]).inc();
                SweepRecord {
                    finished_at: Utc::now(),
                    report: Some(report.clone()),
                    error: None,
                }
            }
            Err(e) => {
                SCHEDULED_SWEEPS.with_label_values(&["failed"]).inc();
                warn!(root, error = %e, "Scheduled sweep failed");
                SweepRecord {
                    finished_at: Utc::now(),
                    report: None,
                    error: Some(e.to_string()),
                }
            }
        };
        *last.write().await = Some(record);
        result
    }
}

impl Drop for MaintenanceScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
