//! Storage hygiene: junk removal for one release and small-file sweeps.
//!
//! Planning ([`plan_ad_cleanup`], [`plan_size_sweep`]) is pure over a
//! [`TreeSnapshot`](crate::tree::TreeSnapshot); [`CleanupService`] scans,
//! plans and executes, collecting failures instead of stopping at the first.

mod executor;
mod planner;
mod rules;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::CleanupConfig;
use crate::storage::{Session, SessionError};
use crate::tree::RemoteTree;

pub use executor::{
    execute_plan, prune_empty_directories, ExecutionOutcome, FailureDetail, FailureLog,
};
pub use planner::{match_directories, plan_ad_cleanup, plan_size_sweep, CleanupPlan};
pub use rules::{CleanupRules, FileVerdict, JunkReason};

/// Result of cleaning one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub root: String,
    pub deleted: usize,
    /// Files and emptied directories whose removal failed.
    pub failed: usize,
    pub kept: usize,
    pub bytes_freed: u64,
    pub empty_dirs_removed: usize,
    /// Subdirectories that could not be listed and were skipped.
    pub scan_failures: usize,
    pub failures: FailureLog,
}

impl CleanupReport {
    fn new(root: &str, failure_limit: usize) -> Self {
        Self {
            root: root.to_string(),
            deleted: 0,
            failed: 0,
            kept: 0,
            bytes_freed: 0,
            empty_dirs_removed: 0,
            scan_failures: 0,
            failures: FailureLog::new(failure_limit),
        }
    }

    /// Something went wrong somewhere in the run.
    pub fn is_partial_failure(&self) -> bool {
        self.failures.total() > 0
    }
}

/// Result of cleaning every directory matching a catalog code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeCleanupReport {
    pub code: String,
    pub parent: String,
    /// One report per matching directory; empty when nothing matched.
    pub directories: Vec<CleanupReport>,
}

impl CodeCleanupReport {
    pub fn deleted(&self) -> usize {
        self.directories.iter().map(|d| d.deleted).sum()
    }

    pub fn failed(&self) -> usize {
        self.directories.iter().map(|d| d.failed).sum()
    }
}

/// Scans, plans and executes cleanups.
#[derive(Debug, Clone)]
pub struct CleanupService {
    rules: CleanupRules,
    failure_limit: usize,
}

impl CleanupService {
    pub fn new(rules: CleanupRules, failure_limit: usize) -> Self {
        Self {
            rules,
            failure_limit,
        }
    }

    pub fn from_config(config: &CleanupConfig) -> Self {
        Self::new(CleanupRules::from(config), config.failure_detail_limit)
    }

    pub fn rules(&self) -> &CleanupRules {
        &self.rules
    }

    /// Junk cleanup of every subdirectory of `parent` matching `code`.
    ///
    /// Only a failure to list `parent` is an error; failures inside one
    /// directory are recorded in its report.
    pub async fn clean_code(
        &self,
        session: &Session,
        parent: &str,
        code: &str,
    ) -> Result<CodeCleanupReport, SessionError> {
        let entries = session.list(parent).await?;
        let matches = match_directories(parent, &entries, code);
        info!(code, parent, matches = matches.len(), "Cleaning directories for code");

        let mut directories = Vec::with_capacity(matches.len());
        for dir in matches {
            directories.push(self.clean_directory(session, &dir, code).await);
        }

        Ok(CodeCleanupReport {
            code: code.to_string(),
            parent: parent.to_string(),
            directories,
        })
    }

    /// Junk cleanup of one directory.
    pub async fn clean_directory(&self, session: &Session, dir: &str, code: &str) -> CleanupReport {
        let mut report = CleanupReport::new(dir, self.failure_limit);

        let snapshot = match RemoteTree::scan(session, dir).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(dir, error = %e, "Cannot scan directory for cleanup");
                report.scan_failures = 1;
                report.failures.record(dir, e.to_string());
                return report;
            }
        };
        record_scan_failures(&mut report, &snapshot.failures);

        let plan = plan_ad_cleanup(&snapshot, code, &self.rules);
        report.kept = plan.kept.len();
        self.execute(session, &plan, "junk", &mut report).await;

        info!(
            dir,
            deleted = report.deleted,
            failed = report.failed,
            kept = report.kept,
            "Junk cleanup finished"
        );
        report
    }

    /// Delete every file under `root` smaller than `threshold_bytes`, then
    /// remove the directories left empty.
    pub async fn sweep_small_files(
        &self,
        session: &Session,
        root: &str,
        threshold_bytes: u64,
    ) -> Result<CleanupReport, SessionError> {
        let mut report = CleanupReport::new(root, self.failure_limit);
        if threshold_bytes == 0 {
            return Ok(report);
        }

        let snapshot = RemoteTree::scan(session, root).await?;
        record_scan_failures(&mut report, &snapshot.failures);

        let plan = plan_size_sweep(&snapshot, threshold_bytes);
        report.kept = plan.kept.len();
        self.execute(session, &plan, "small", &mut report).await;

        match RemoteTree::find_empty_directories(session, root).await {
            Ok(empty) => {
                let removed = prune_empty_directories(session, &empty, &mut report.failures).await;
                report.empty_dirs_removed = removed;
                report.failed += empty.len() - removed;
            }
            Err(e) => {
                warn!(root, error = %e, "Cannot rescan for empty directories");
                report.scan_failures += 1;
                report.failures.record(root, e.to_string());
            }
        }

        info!(
            root,
            threshold_bytes,
            deleted = report.deleted,
            failed = report.failed,
            empty_dirs_removed = report.empty_dirs_removed,
            "Small-file sweep finished"
        );
        Ok(report)
    }

    async fn execute(
        &self,
        session: &Session,
        plan: &CleanupPlan,
        pass: &'static str,
        report: &mut CleanupReport,
    ) {
        if plan.is_empty() {
            return;
        }
        debug!(
            root = %report.root,
            pass,
            files = plan.to_delete.len(),
            bytes = plan.bytes_to_free(),
            "Executing cleanup plan"
        );
        let outcome = execute_plan(session, &plan.to_delete, pass, &mut report.failures).await;
        report.deleted = outcome.deleted;
        report.failed = outcome.failed;
        report.bytes_freed = outcome.bytes_freed;
    }
}

fn record_scan_failures(report: &mut CleanupReport, failures: &[crate::tree::SubtreeFailure]) {
    report.scan_failures = failures.len();
    for failure in failures {
        report
            .failures
            .record(failure.path.clone(), failure.reason.clone());
    }
}
