//! Magnet search for catalog codes.
//!
//! A [`MagnetSearcher`] returns raw records; [`decode_record`] turns each into
//! a [`CandidateEntry`] and [`select_candidate`] picks the one to download.

mod http;
mod record;
mod selector;
mod size;
mod types;

use std::time::Instant;

use tracing::{info, warn};

use crate::metrics::{SEARCH_DURATION, SEARCH_LOOKUPS};

pub use http::HttpSearcher;
pub use record::{decode_record, is_magnet};
pub use selector::{select_candidate, select_from_records, HD_RATIO};
pub use size::{parse_size, SizeParseError};
pub use types::*;

/// Search for `code` and select the best candidate.
///
/// Service failures are returned as errors; "nothing usable" is
/// [`Selection::NoCandidates`].
pub async fn resolve_code(
    searcher: &dyn MagnetSearcher,
    code: &str,
) -> Result<Selection, SearchError> {
    let start = Instant::now();
    let records = match searcher.search(code).await {
        Ok(records) => records,
        Err(e) => {
            SEARCH_LOOKUPS.with_label_values(&["failed"]).inc();
            SEARCH_DURATION
                .with_label_values(&["failed"])
                .observe(start.elapsed().as_secs_f64());
            warn!(code, backend = searcher.name(), error = %e, "Search failed");
            return Err(e);
        }
    };

    let selection = select_from_records(&records);
    let result = match &selection {
        Selection::Selected { .. } => "selected",
        Selection::NoCandidates { reason } => {
            info!(code, reason = %reason, "No candidates for code");
            "no_candidates"
        }
    };
    SEARCH_LOOKUPS.with_label_values(&[result]).inc();
    SEARCH_DURATION
        .with_label_values(&[result])
        .observe(start.elapsed().as_secs_f64());

    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockSearcher};

    #[tokio::test]
    async fn test_resolve_code_selects_from_search_results() {
        let searcher = MockSearcher::new();
        searcher
            .set_records(
                "SONE-622",
                vec![
                    fixtures::record("magnet:?xt=urn:btih:a", "SONE-622", "6GB", "2024-01-01"),
                    fixtures::record("magnet:?xt=urn:btih:b", "SONE-622 FHD", "5GB", "2024-01-02"),
                    fixtures::record("magnet:?xt=urn:btih:c", "SONE-622 SD", "1GB", "2024-01-03"),
                ],
            )
            .await;

        let selection = resolve_code(&searcher, "SONE-622").await.unwrap();
        assert_eq!(
            selection.entry().map(|e| e.magnet_uri.as_str()),
            Some("magnet:?xt=urn:btih:b")
        );
        assert_eq!(searcher.recorded_searches().await, vec!["SONE-622".to_string()]);
    }

    #[tokio::test]
    async fn test_resolve_code_unknown_code_has_no_candidates() {
        let searcher = MockSearcher::new();
        let selection = resolve_code(&searcher, "ABC-001").await.unwrap();
        assert!(matches!(selection, Selection::NoCandidates { .. }));
    }

    #[tokio::test]
    async fn test_resolve_code_propagates_service_errors() {
        let searcher = MockSearcher::new();
        searcher.set_next_error(SearchError::Timeout).await;
        assert_eq!(
            resolve_code(&searcher, "ABC-001").await,
            Err(SearchError::Timeout)
        );
    }
}
