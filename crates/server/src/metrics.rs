//! Prometheus metrics for observability.
//!
//! HTTP request metrics live here; the domain counters (logins, lookups,
//! submissions, cleanup) come from `stashbot_core::metrics` and are
//! registered into the same registry. A few gauges are collected from the
//! application state right before each scrape.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "stashbot_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("stashbot_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stashbot_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Rejected callers.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "stashbot_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

/// Requests refused because no storage session could be obtained.
pub static SESSION_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "stashbot_session_failures_total",
        "Requests refused because the storage login failed",
    )
    .unwrap()
});

// =============================================================================
// State Gauges (collected dynamically)
// =============================================================================

/// Whether a storage credential is cached and unexpired.
pub static STORAGE_CREDENTIAL_VALID: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stashbot_storage_credential_valid",
        "Whether a valid storage credential is cached (1) or not (0)",
    )
    .unwrap()
});

/// Scheduled sweep running state (1 = running, 0 = stopped).
pub static MAINTENANCE_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "stashbot_maintenance_running",
        "Whether the scheduled sweep is running (1) or stopped (0)",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(SESSION_FAILURES_TOTAL.clone()))
        .unwrap();

    // State
    registry
        .register(Box::new(STORAGE_CREDENTIAL_VALID.clone()))
        .unwrap();
    registry
        .register(Box::new(MAINTENANCE_RUNNING.clone()))
        .unwrap();

    // Core metrics (storage, search, batch, cleanup)
    for metric in stashbot_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Refresh the gauges that mirror application state.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let valid = state.credentials().is_valid().await;
    STORAGE_CREDENTIAL_VALID.set(i64::from(valid));

    if let Some(maintenance) = state.maintenance() {
        let status = maintenance.status().await;
        MAINTENANCE_RUNNING.set(i64::from(status.running));
    }
}

/// Label for a request path: the matched route template, or a fixed
/// placeholder so unknown paths cannot blow up label cardinality.
pub fn path_label(matched: Option<&str>) -> String {
    matched.unwrap_or("unmatched").to_string()
}
