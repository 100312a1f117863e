//! Picks one entry among competing search results.

use std::cmp::Ordering;

use tracing::{debug, info};

use super::record::decode_record;
use super::{CandidateEntry, Selection, SelectionStats};

/// Entries at or above this fraction of the largest size form the HD cluster.
pub const HD_RATIO: f64 = 0.7;

/// Decode raw records and select one. Undecodable records are skipped.
pub fn select_from_records(records: &[String]) -> Selection {
    let mut entries = Vec::with_capacity(records.len());
    let mut rejected = 0;

    for raw in records {
        match decode_record(raw) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                rejected += 1;
                debug!(error = %e, "Skipping search record");
            }
        }
    }

    if entries.is_empty() {
        let reason = if records.is_empty() {
            "search returned no results".to_string()
        } else {
            format!(
                "found {} results but none could be parsed",
                records.len()
            )
        };
        return Selection::NoCandidates { reason };
    }

    match select_candidate(entries) {
        Selection::Selected { entry, mut stats } => {
            stats.rejected = rejected;
            Selection::Selected { entry, stats }
        }
        none => none,
    }
}

/// Choose the smallest entry of the HD cluster, newest first on ties.
///
/// The HD cluster holds entries whose size is at least [`HD_RATIO`] of the
/// largest. When every size is zero the first entry wins.
pub fn select_candidate(entries: Vec<CandidateEntry>) -> Selection {
    let parsed = entries.len();
    let Some(max_size) = entries.iter().map(|e| e.size_bytes).max() else {
        return Selection::NoCandidates {
            reason: "no usable candidates".to_string(),
        };
    };

    if max_size == 0 {
        let stats = SelectionStats {
            parsed,
            cluster_size: parsed,
            ..Default::default()
        };
        // Sizes cannot discriminate; keep the service's own ordering.
        let Some(entry) = entries.into_iter().next() else {
            return Selection::NoCandidates {
                reason: "no usable candidates".to_string(),
            };
        };
        info!(name = %entry.display_name, parsed, "Selected first candidate (no sizes)");
        return Selection::Selected { entry, stats };
    }

    let threshold = max_size as f64 * HD_RATIO;
    let (mut cluster, rest): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|e| e.size_bytes as f64 >= threshold);
    if cluster.is_empty() {
        cluster = rest;
    }

    cluster.sort_by(compare_candidates);

    let stats = SelectionStats {
        parsed,
        rejected: 0,
        max_size,
        threshold: threshold as u64,
        cluster_size: cluster.len(),
    };

    let Some(entry) = cluster.into_iter().next() else {
        return Selection::NoCandidates {
            reason: "no usable candidates".to_string(),
        };
    };

    info!(
        name = %entry.display_name,
        size = entry.size_bytes,
        parsed,
        max_size,
        cluster = stats.cluster_size,
        "Selected candidate"
    );
    Selection::Selected { entry, stats }
}

/// Size ascending, then date descending with unknown dates last.
fn compare_candidates(a: &CandidateEntry, b: &CandidateEntry) -> Ordering {
    a.size_bytes
        .cmp(&b.size_bytes)
        .then_with(|| match (a.upload_date, b.upload_date) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use chrono::NaiveDate;

    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * MB;

    fn entry(name: &str, size: u64, date: Option<(i32, u32, u32)>) -> CandidateEntry {
        CandidateEntry {
            magnet_uri: format!("magnet:?xt=urn:btih:{}", name),
            display_name: name.to_string(),
            size_bytes: size,
            upload_date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        }
    }

    fn chosen(selection: &Selection) -> &str {
        &selection.entry().unwrap().display_name
    }

    #[test]
    fn test_smallest_of_hd_cluster_wins() {
        let selection = select_candidate(vec![
            entry("sd", 100 * MB, None),
            entry("hd", GB, None),
            entry("hd-big", GB + GB / 10, None),
            entry("tiny", 50 * MB, None),
        ]);

        assert_eq!(chosen(&selection), "hd");
        let Selection::Selected { stats, .. } = selection else {
            panic!("expected selection");
        };
        assert_eq!(stats.cluster_size, 2);
        assert_eq!(stats.max_size, GB + GB / 10);
        assert_eq!(stats.threshold, ((GB + GB / 10) as f64 * 0.7) as u64);
    }

    #[test]
    fn test_size_tie_prefers_later_date() {
        let selection = select_candidate(vec![
            entry("older", GB, Some((2023, 1, 1))),
            entry("newer", GB, Some((2024, 6, 1))),
            entry("undated", GB, None),
        ]);
        assert_eq!(chosen(&selection), "newer");
    }

    #[test]
    fn test_unknown_date_sorts_last_among_ties() {
        let selection = select_candidate(vec![
            entry("undated", GB, None),
            entry("dated", GB, Some((2020, 1, 1))),
        ]);
        assert_eq!(chosen(&selection), "dated");
    }

    #[test]
    fn test_all_zero_sizes_falls_back_to_first() {
        let selection = select_candidate(vec![
            entry("first", 0, None),
            entry("second", 0, Some((2024, 1, 1))),
        ]);
        assert_eq!(chosen(&selection), "first");
    }

    #[test]
    fn test_empty_input_has_no_candidates() {
        assert!(matches!(
            select_candidate(vec![]),
            Selection::NoCandidates { .. }
        ));
    }

    #[test]
    fn test_select_from_records_skips_bad_records() {
        let records = vec![
            "not a record".to_string(),
            fixtures::record("magnet:?xt=urn:btih:aaa", "ABP-123", "4.2GB", "2024-01-01"),
            fixtures::record("magnet:?xt=urn:btih:bbb", "ABP-123 bad", "??", "2024-01-02"),
            fixtures::record("http://not-a-magnet", "ABP-123", "5GB", "2024-01-03"),
        ];

        let selection = select_from_records(&records);
        assert_eq!(chosen(&selection), "ABP-123");
        let Selection::Selected { stats, .. } = selection else {
            panic!("expected selection");
        };
        assert_eq!(stats.parsed, 1);
        assert_eq!(stats.rejected, 3);
    }

    #[test]
    fn test_select_from_records_reasons() {
        let Selection::NoCandidates { reason } = select_from_records(&[]) else {
            panic!("expected no candidates");
        };
        assert!(reason.contains("no results"));

        let Selection::NoCandidates { reason } =
            select_from_records(&["[]".to_string(), "garbage".to_string()])
        else {
            panic!("expected no candidates");
        };
        assert!(reason.contains("2 results"));
    }
}
