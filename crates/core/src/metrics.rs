//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Storage service (logins, calls by operation)
//! - Magnet search (lookups, latency)
//! - Acquisition (submissions, batch items)
//! - Cleanup (deleted files, empty directories, scheduled sweeps)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Storage Metrics
// =============================================================================

/// Storage logins by result.
pub static STORAGE_LOGINS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stashbot_storage_logins_total", "Total storage logins"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Storage calls by operation and outcome.
pub static STORAGE_CALLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "stashbot_storage_calls_total",
            "Total authenticated storage calls",
        ),
        &["operation", "outcome"], // outcome: "success", "unauthorized", "failed"
    )
    .unwrap()
});

// =============================================================================
// Search Metrics
// =============================================================================

/// Catalog-code lookups by result.
pub static SEARCH_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stashbot_search_lookups_total", "Total catalog-code lookups"),
        &["result"], // "selected", "no_candidates", "failed"
    )
    .unwrap()
});

/// Search service latency in seconds.
pub static SEARCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "stashbot_search_duration_seconds",
            "Duration of magnet search requests",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Acquisition Metrics
// =============================================================================

/// Offline download submissions by result.
pub static MAGNETS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "stashbot_magnets_submitted_total",
            "Total magnets submitted for offline download",
        ),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Batch items processed by outcome.
pub static BATCH_ITEMS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stashbot_batch_items_total", "Total batch items processed"),
        &["outcome"], // "succeeded", "not_found", "failed"
    )
    .unwrap()
});

// =============================================================================
// Cleanup Metrics
// =============================================================================

/// Files deleted or failed to delete, by pass.
pub static CLEANUP_FILES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stashbot_cleanup_files_total", "Files handled by cleanup"),
        &["pass", "result"], // pass: "junk", "small"; result: "deleted", "failed"
    )
    .unwrap()
});

/// Empty directories removed.
pub static EMPTY_DIRS_REMOVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "stashbot_empty_dirs_removed_total",
        "Total empty directories removed",
    )
    .unwrap()
});

/// Subtrees that could not be listed during a scan.
pub static SUBTREE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "stashbot_tree_subtree_failures_total",
        "Total directories that failed to list during a tree scan",
    )
    .unwrap()
});

/// Scheduled sweeps by result.
pub static SCHEDULED_SWEEPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stashbot_scheduled_sweeps_total", "Total scheduled sweeps"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Storage
        Box::new(STORAGE_LOGINS.clone()),
        Box::new(STORAGE_CALLS.clone()),
        // Search
        Box::new(SEARCH_LOOKUPS.clone()),
        Box::new(SEARCH_DURATION.clone()),
        // Acquisition
        Box::new(MAGNETS_SUBMITTED.clone()),
        Box::new(BATCH_ITEMS.clone()),
        // Cleanup
        Box::new(CLEANUP_FILES.clone()),
        Box::new(EMPTY_DIRS_REMOVED.clone()),
        Box::new(SUBTREE_FAILURES.clone()),
        Box::new(SCHEDULED_SWEEPS.clone()),
    ]
}
