//! Takes one input line from classification to a queued download.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::catalog_code::{classify_input, InputKind};
use crate::metrics::MAGNETS_SUBMITTED;
use crate::search::{resolve_code, MagnetSearcher, Selection};
use crate::storage::Session;

use super::item::{BatchItem, ItemStatus};

/// Resolves and submits single inputs.
pub struct Submitter {
    searcher: Arc<dyn MagnetSearcher>,
    offline_dir: String,
}

impl Submitter {
    pub fn new(searcher: Arc<dyn MagnetSearcher>, offline_dir: impl Into<String>) -> Self {
        Self {
            searcher,
            offline_dir: offline_dir.into(),
        }
    }

    pub fn offline_dir(&self) -> &str {
        &self.offline_dir
    }

    /// Process one input. Never fails: every problem ends up in the item's
    /// terminal status and message.
    pub async fn process(&self, session: &Session, raw_input: &str) -> BatchItem {
        let mut item = BatchItem::new(raw_input.trim());

        let magnet = match classify_input(raw_input) {
            InputKind::Unrecognized(_) => {
                step(&mut item, ItemStatus::Failed, "not a magnet link or catalog code");
                return item;
            }
            InputKind::Magnet(magnet) => magnet,
            InputKind::Code(code) => match self.search(&mut item, &code).await {
                Some(magnet) => magnet,
                None => return item,
            },
        };

        self.submit(session, &mut item, magnet).await;
        item
    }

    async fn search(&self, item: &mut BatchItem, code: &str) -> Option<String> {
        step(item, ItemStatus::Searching, format!("searching {}", code));

        match resolve_code(self.searcher.as_ref(), code).await {
            Ok(Selection::Selected { entry, .. }) => {
                debug!(code, name = %entry.display_name, "Found magnet for code");
                step(item, ItemStatus::Found, entry.display_name.clone());
                item.magnet_uri = Some(entry.magnet_uri.clone());
                Some(entry.magnet_uri)
            }
            Ok(Selection::NoCandidates { reason }) => {
                step(item, ItemStatus::NotFound, reason);
                None
            }
            Err(e) => {
                step(item, ItemStatus::Failed, format!("search failed: {}", e));
                None
            }
        }
    }

    async fn submit(&self, session: &Session, item: &mut BatchItem, magnet: String) {
        step(item, ItemStatus::Submitted, format!("submitting to {}", self.offline_dir));

        match session.submit_magnet(&self.offline_dir, &magnet).await {
            Ok(()) => {
                MAGNETS_SUBMITTED.with_label_values(&["success"]).inc();
                info!(input = %item.raw_input, dir = %self.offline_dir, "Queued offline download");
                step(item, ItemStatus::Succeeded, "queued for offline download");
            }
            Err(e) => {
                MAGNETS_SUBMITTED.with_label_values(&["failed"]).inc();
                warn!(input = %item.raw_input, error = %e, "Offline download submission failed");
                step(item, ItemStatus::Failed, format!("submission failed: {}", e));
            }
        }
        item.magnet_uri = Some(magnet);
    }
}

/// Apply a transition the submitter's own flow guarantees to be legal.
fn step(item: &mut BatchItem, next: ItemStatus, message: impl Into<String>) {
    if let Err(e) = item.transition(next, message) {
        error!(input = %item.raw_input, error = %e, "Illegal batch item transition");
        item.status = ItemStatus::Failed;
    }
}
