//! Sequential, paced processing of many inputs.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BatchConfig;
use crate::metrics::BATCH_ITEMS;
use crate::storage::Session;

use super::item::{BatchItem, ItemStatus};
use super::report::{BatchProgress, BatchReport, RefreshOutcome};
use super::submitter::Submitter;

/// Called after every item of a multi-item run.
pub type ProgressCallback = Arc<dyn Fn(&BatchProgress) + Send + Sync>;

/// Runs inputs one after another with a fixed pause between them.
pub struct BatchCoordinator {
    submitter: Arc<Submitter>,
    config: BatchConfig,
}

impl BatchCoordinator {
    pub fn new(submitter: Arc<Submitter>, config: BatchConfig) -> Self {
        Self { submitter, config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Finished items, one at a time, in input order. Each item is
    /// processed only when polled; the configured delay separates items.
    pub fn items<'a>(
        &'a self,
        session: &'a Session,
        inputs: Vec<String>,
    ) -> impl Stream<Item = BatchItem> + 'a {
        let delay = Duration::from_millis(self.config.item_delay_ms);
        stream::unfold(
            (inputs.into_iter(), true),
            move |(mut inputs, first)| async move {
                let input = inputs.next()?;
                if !first && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let item = self.submitter.process(session, &input).await;
                Some((item, (inputs, false)))
            },
        )
    }

    /// Process every input and aggregate the outcomes.
    ///
    /// When anything succeeded, a refresh listing of the offline directory
    /// follows after the configured delay; its failure is reported, not
    /// raised.
    pub async fn run(
        &self,
        session: &Session,
        inputs: Vec<String>,
        progress: Option<ProgressCallback>,
    ) -> BatchReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let total = inputs.len();
        info!(%run_id, total, "Starting batch");

        let mut items = Vec::with_capacity(total);
        let mut succeeded = 0;
        let mut failed = 0;

        let stream = self.items(session, inputs);
        futures::pin_mut!(stream);
        while let Some(item) = stream.next().await {
            if item.is_success() {
                succeeded += 1;
            } else {
                failed += 1;
            }
            BATCH_ITEMS.with_label_values(&[outcome_label(item.status)]).inc();
            debug!(
                %run_id,
                position = items.len() + 1,
                total,
                input = %item.raw_input,
                status = ?item.status,
                "Batch item finished"
            );

            if total > 1 {
                if let Some(callback) = &progress {
                    callback(&BatchProgress {
                        run_id,
                        position: items.len() + 1,
                        total,
                        succeeded,
                        failed,
                        current: item.clone(),
                    });
                }
            }
            items.push(item);
        }

        let refresh = if succeeded > 0 {
            self.refresh(session).await
        } else {
            RefreshOutcome::Skipped
        };

        info!(%run_id, total, succeeded, failed, "Batch finished");
        BatchReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            items,
            refresh,
        }
    }

    async fn refresh(&self, session: &Session) -> RefreshOutcome {
        let delay = Duration::from_millis(self.config.refresh_delay_ms);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let dir = self.submitter.offline_dir();
        match session.refresh(dir).await {
            Ok(entries) => {
                debug!(dir, entries = entries.len(), "Refreshed offline directory");
                RefreshOutcome::Refreshed {
                    entries: entries.len(),
                }
            }
            Err(e) => {
                warn!(dir, error = %e, "Refresh after submission failed");
                RefreshOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn outcome_label(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::Succeeded => "succeeded",
        ItemStatus::NotFound => "not_found",
        _ => "failed",
    }
}
