//! Carries out deletion plans against the storage service.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::metrics::{CLEANUP_FILES, EMPTY_DIRS_REMOVED};
use crate::storage::{split_path, Session};
use crate::tree::RemoteNode;

/// One failed deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDetail {
    pub path: String,
    pub reason: String,
}

/// Failure details capped at a fixed number; the rest are only counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureLog {
    #[serde(skip)]
    limit: usize,
    pub details: Vec<FailureDetail>,
    pub elided: usize,
}

impl FailureLog {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            details: Vec::new(),
            elided: 0,
        }
    }

    pub fn record(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        if self.details.len() < self.limit {
            self.details.push(FailureDetail {
                path: path.into(),
                reason: reason.into(),
            });
        } else {
            self.elided += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.details.len() + self.elided
    }
}

/// Counts from executing one plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub deleted: usize,
    pub failed: usize,
    /// Bytes of the files whose batch was removed.
    pub bytes_freed: u64,
}

/// Delete every node, one `remove` call per parent directory.
///
/// A failed call marks all of its files failed; the remaining directories are
/// still processed.
pub async fn execute_plan(
    session: &Session,
    to_delete: &[RemoteNode],
    pass: &'static str,
    failures: &mut FailureLog,
) -> ExecutionOutcome {
    let mut by_dir: BTreeMap<String, (Vec<String>, u64)> = BTreeMap::new();
    for node in to_delete {
        let (dir, name) = split_path(&node.path);
        let batch = by_dir.entry(dir).or_default();
        batch.0.push(name);
        batch.1 += node.size_bytes;
    }

    let mut outcome = ExecutionOutcome::default();
    for (dir, (names, bytes)) in by_dir {
        match session.remove(&dir, &names).await {
            Ok(()) => {
                info!(dir = %dir, count = names.len(), pass, "Deleted files");
                CLEANUP_FILES
                    .with_label_values(&[pass, "deleted"])
                    .inc_by(names.len() as u64);
                outcome.deleted += names.len();
                outcome.bytes_freed += bytes;
            }
            Err(e) => {
                warn!(dir = %dir, count = names.len(), pass, error = %e, "Failed to delete files");
                CLEANUP_FILES
                    .with_label_values(&[pass, "failed"])
                    .inc_by(names.len() as u64);
                outcome.failed += names.len();
                let reason = e.to_string();
                for name in &names {
                    failures.record(format!("{}/{}", dir.trim_end_matches('/'), name), reason.clone());
                }
            }
        }
    }
    outcome
}

/// Remove directories in the given order (children before parents).
/// Returns how many were removed; the rest are recorded in `failures`.
pub async fn prune_empty_directories(
    session: &Session,
    directories: &[String],
    failures: &mut FailureLog,
) -> usize {
    let mut removed = 0;
    for path in directories {
        let (parent, name) = split_path(path);
        match session.remove(&parent, std::slice::from_ref(&name)).await {
            Ok(()) => {
                info!(path = %path, "Removed empty directory");
                EMPTY_DIRS_REMOVED.inc();
                removed += 1;
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to remove empty directory");
                failures.record(path.clone(), e.to_string());
            }
        }
    }
    removed
}
