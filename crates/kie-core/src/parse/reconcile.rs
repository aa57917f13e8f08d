//! Merging per-chunk extractions into one record.

use tracing::{debug, trace};

use crate::models::output::ParsedRecord;

/// Merge records parsed from chunks of the same document.
///
/// For every key, the values of the chunks that found it are put to a
/// case-insensitive majority vote. Ties go to the value seen first. Keys no
/// chunk found stay absent.
pub fn reconcile<S: AsRef<str>>(chunks: &[ParsedRecord], prompt_keys: &[S]) -> ParsedRecord {
    let mut merged = ParsedRecord::new();

    for key in prompt_keys {
        let key = key.as_ref();
        let candidates: Vec<&str> = chunks
            .iter()
            .filter_map(|chunk| chunk.get(key))
            .map(String::as_str)
            .collect();

        let Some(winner) = majority_vote(&candidates) else {
            trace!("Key {:?} found in no chunk", key);
            continue;
        };

        debug!(
            "Key {:?}: {:?} chosen from {} candidate(s)",
            key,
            winner,
            candidates.len()
        );
        merged.insert(key.to_string(), winner.to_string());
    }

    merged
}

/// Most frequent value, compared case-insensitively, in the casing of its
/// first occurrence. Ties go to the value that appears first.
pub fn majority_vote<'a>(candidates: &[&'a str]) -> Option<&'a str> {
    let folded: Vec<String> = candidates.iter().map(|c| c.to_lowercase()).collect();
    let mut best: Option<(usize, usize)> = None;

    for (index, value) in folded.iter().enumerate() {
        if folded[..index].contains(value) {
            continue;
        }
        let count = folded[index..].iter().filter(|v| *v == value).count();
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((index, count));
        }
    }

    best.map(|(index, _)| candidates[index])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(pairs: &[(&str, &str)]) -> ParsedRecord {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_majority_wins() {
        let chunks = vec![
            record(&[("Charity Name", "Havens Hospice")]),
            record(&[("Charity Name", "Havens Christian Hospice")]),
            record(&[("Charity Name", "Havens Christian Hospice")]),
        ];
        let merged = reconcile(&chunks, &["Charity Name"]);
        assert_eq!(merged, record(&[("Charity Name", "Havens Christian Hospice")]));
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let chunks = vec![
            record(&[("Annual Income", "100")]),
            record(&[("Annual Income", "200")]),
        ];
        assert_eq!(
            reconcile(&chunks, &["Annual Income"]),
            record(&[("Annual Income", "100")])
        );
    }

    #[test]
    fn test_vote_ignores_case_but_keeps_first_casing() {
        let chunks = vec![
            record(&[("Charity Name", "Havens")]),
            record(&[("Charity Name", "OTHER")]),
            record(&[("Charity Name", "HAVENS")]),
        ];
        assert_eq!(
            reconcile(&chunks, &["Charity Name"]),
            record(&[("Charity Name", "Havens")])
        );
    }

    #[test]
    fn test_keys_missing_everywhere_stay_absent() {
        let chunks = vec![
            record(&[("Charity Name", "Havens")]),
            record(&[("Annual Income", "10348000.00")]),
        ];
        let merged = reconcile(&chunks, &["Charity Name", "Charity Number", "Annual Income"]);

        assert_eq!(
            merged,
            record(&[("Charity Name", "Havens"), ("Annual Income", "10348000.00")])
        );
        assert!(!merged.contains_key("Charity Number"));
    }

    #[test]
    fn test_single_chunk_is_identity() {
        let only = record(&[("Charity Name", "Havens"), ("Annual Income", "10")]);
        assert_eq!(
            reconcile(std::slice::from_ref(&only), &["Charity Name", "Annual Income"]),
            only
        );
    }

    #[test]
    fn test_no_chunks_or_keys() {
        let keys: [&str; 0] = [];
        assert!(reconcile(&[], &["Charity Name"]).is_empty());
        assert!(reconcile(&[record(&[("a", "b")])], &keys).is_empty());
        assert_eq!(majority_vote(&[]), None);
    }
}
