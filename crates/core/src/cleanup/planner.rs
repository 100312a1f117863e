//! Pure planning over a tree snapshot.

use serde::Serialize;

use crate::catalog_code::normalize_code;
use crate::storage::{join_path, RemoteEntry};
use crate::tree::{RemoteNode, TreeSnapshot};

use super::rules::{CleanupRules, FileVerdict};

/// Files to delete and files explicitly kept, in snapshot order.
///
/// No node is ever in both lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupPlan {
    pub to_delete: Vec<RemoteNode>,
    pub kept: Vec<RemoteNode>,
}

impl CleanupPlan {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty()
    }

    pub fn bytes_to_free(&self) -> u64 {
        self.to_delete.iter().map(|n| n.size_bytes).sum()
    }
}

/// Junk pass over every file of a directory belonging to `code`.
pub fn plan_ad_cleanup(snapshot: &TreeSnapshot, code: &str, rules: &CleanupRules) -> CleanupPlan {
    let mut plan = CleanupPlan::default();
    for node in snapshot.files() {
        match rules.classify(node.name(), code) {
            FileVerdict::Keep => plan.kept.push(node.clone()),
            FileVerdict::Delete(_) => plan.to_delete.push(node.clone()),
            FileVerdict::Untouched => {}
        }
    }
    plan
}

/// Every file strictly smaller than `threshold_bytes`. A zero threshold
/// plans nothing.
pub fn plan_size_sweep(snapshot: &TreeSnapshot, threshold_bytes: u64) -> CleanupPlan {
    let mut plan = CleanupPlan::default();
    if threshold_bytes == 0 {
        return plan;
    }
    for node in snapshot.files() {
        if node.size_bytes < threshold_bytes {
            plan.to_delete.push(node.clone());
        } else {
            plan.kept.push(node.clone());
        }
    }
    plan
}

/// Subdirectories of `parent` whose normalized name starts with the
/// normalized `code`. Every match is returned.
pub fn match_directories(parent: &str, entries: &[RemoteEntry], code: &str) -> Vec<String> {
    let wanted = normalize_code(code);
    if wanted.is_empty() {
        return Vec::new();
    }
    entries
        .iter()
        .filter(|e| e.is_dir && normalize_code(&e.name).starts_with(&wanted))
        .map(|e| join_path(parent, &e.name))
        .collect()
}
