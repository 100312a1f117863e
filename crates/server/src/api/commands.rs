//! Command endpoints: submit magnets or codes, clean, refresh.
//!
//! Every handler here runs behind the session middleware and receives the
//! request's storage [`Session`] as an extension.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use stashbot_core::{
    BatchProgress, BatchSummary, CleanupReport, CodeCleanupReport, ProgressCallback, Session,
    SessionError,
};
use tracing::{info, warn};

use super::handlers::{error_response, ApiError};
use super::middleware::AuthUser;
use crate::state::AppState;

/// Target of `POST /clean` that selects the small-file sweep.
pub const SWEEP_TARGET: &str = "/";

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    /// One magnet link or catalog code per line.
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct CleanBody {
    /// A catalog code, or "/" for the small-file sweep.
    pub target: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CleanResponse {
    Sweep(CleanupReport),
    Code(CodeCleanupReport),
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub dir: String,
    pub entries: usize,
}

fn upstream_error(e: SessionError) -> ApiError {
    error_response(StatusCode::BAD_GATEWAY, e.to_string())
}

/// Process a message of magnets and codes, one per line.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Extension(session): Extension<Session>,
    Json(body): Json<MessageBody>,
) -> Result<Json<BatchSummary>, ApiError> {
    let lines: Vec<String> = body
        .text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    if lines.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "message contains no magnet link or catalog code",
        ));
    }

    info!(user = %user, lines = lines.len(), "Processing message");

    let progress_user = user.clone();
    let progress: ProgressCallback = Arc::new(move |p: &BatchProgress| {
        info!(
            user = %progress_user,
            run_id = %p.run_id,
            position = p.position,
            total = p.total,
            succeeded = p.succeeded,
            failed = p.failed,
            "Batch progress"
        );
    });

    let report = state
        .coordinator()
        .run(&session, lines, Some(progress))
        .await;

    Ok(Json(report.summary(state.config().batch.summary_limit)))
}

/// Junk cleanup for a code, or the small-file sweep for "/".
pub async fn clean(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Extension(session): Extension<Session>,
    Json(body): Json<CleanBody>,
) -> Result<Json<CleanResponse>, ApiError> {
    let target = body.target.trim();
    if target.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "target is required"));
    }

    let offline_dir = state.offline_dir();
    info!(user = %user, target, "Cleanup requested");

    if target == SWEEP_TARGET {
        let threshold = state.config().cleanup.small_file_threshold_bytes;
        if threshold == 0 {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "small-file sweep is disabled (cleanup.small_file_threshold_bytes = 0)",
            ));
        }
        let report = state
            .cleanup()
            .sweep_small_files(&session, offline_dir, threshold)
            .await
            .map_err(|e| {
                warn!(error = %e, "Small-file sweep failed");
                upstream_error(e)
            })?;
        return Ok(Json(CleanResponse::Sweep(report)));
    }

    let report = state
        .cleanup()
        .clean_code(&session, offline_dir, target)
        .await
        .map_err(|e| {
            warn!(code = target, error = %e, "Code cleanup failed");
            upstream_error(e)
        })?;
    Ok(Json(CleanResponse::Code(report)))
}

/// Force the storage service to re-read the offline directory.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let dir = state.offline_dir();
    let entries = session.refresh(dir).await.map_err(upstream_error)?;
    Ok(Json(RefreshResponse {
        dir: dir.to_string(),
        entries: entries.len(),
    }))
}
