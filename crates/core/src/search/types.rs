//! Types for magnet search and candidate selection.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use super::size::SizeParseError;

/// One usable search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateEntry {
    pub magnet_uri: String,
    pub display_name: String,
    pub size_bytes: u64,
    /// `None` when the record carried no parseable `YYYY-MM-DD` date.
    pub upload_date: Option<NaiveDate>,
}

/// Figures behind one selection, for logging and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SelectionStats {
    /// Entries that survived record decoding.
    pub parsed: usize,
    /// Records skipped because they could not be decoded.
    pub rejected: usize,
    pub max_size: u64,
    pub threshold: u64,
    pub cluster_size: usize,
}

/// Outcome of picking one entry among the results for a catalog code.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Selection {
    Selected {
        entry: CandidateEntry,
        stats: SelectionStats,
    },
    NoCandidates {
        reason: String,
    },
}

impl Selection {
    pub fn entry(&self) -> Option<&CandidateEntry> {
        match self {
            Selection::Selected { entry, .. } => Some(entry),
            Selection::NoCandidates { .. } => None,
        }
    }
}

/// A raw result record that could not be turned into a [`CandidateEntry`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("record has {found} fields, expected at least 4")]
    TooFewFields { found: usize },

    #[error("record has no magnet URI")]
    MissingMagnet,

    #[error("record size is invalid: {0}")]
    InvalidSize(#[from] SizeParseError),
}

/// Errors that can occur while querying the search service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    /// HTTP error status, or a body whose `status` is not "succeed".
    #[error("Search service error: {0}")]
    Upstream(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Trait for magnet search backends.
#[async_trait]
pub trait MagnetSearcher: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Raw result records for one catalog code. Each record is decoded
    /// separately by [`super::decode_record`].
    async fn search(&self, code: &str) -> Result<Vec<String>, SearchError>;
}
