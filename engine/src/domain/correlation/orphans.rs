//! Orphan Detector
//!
//! Scans request URLs for ID-shaped values that no response ever produced.
//! These usually come from client-side code (a cart id minted by page-load
//! JavaScript, a GUID from local storage) and show where source extraction
//! has a blind spot.
//!
//! A URL value is a sighting when it is:
//! - a path segment or query value shaped like a numeric id (ID-like) or a GUID
//! - a non-empty query value under an ID-shaped parameter name (`orderId=..`)
//!
//! Each value is reported once, at its first sighting, and only when it is
//! absent from the global candidate value set.

use rustc_hash::FxHashSet;
use url::Url;

use super::classify::{ValueType, classify, is_id_key, is_id_like};
use super::strategy::{VariableNames, for_orphan};
use super::types::{CandidateType, Confidence, LocationType, OrphanId};
use super::usages::UsageMatcher;
use crate::core::config::AnalysisConfig;
use crate::utils::url::percent_decode;

/// An ID-shaped value seen in a request URL
#[derive(Debug, Clone, PartialEq, Eq)]
struct Sighting {
    location_type: LocationType,
    location_key: Option<String>,
    value: String,
    value_type: ValueType,
}

fn is_id_shaped(value: &str, value_type: ValueType, config: &AnalysisConfig) -> bool {
    match value_type {
        ValueType::Guid => true,
        ValueType::NumericId => is_id_like(value, config.min_numeric_id_digits),
        _ => false,
    }
}

fn url_sightings(url: &Url, config: &AnalysisConfig) -> Vec<Sighting> {
    let mut sightings = Vec::new();

    if let Some(segments) = url.path_segments() {
        let segments: Vec<String> = segments.map(|s| percent_decode(s).into_owned()).collect();
        for (i, segment) in segments.iter().enumerate() {
            let value_type = classify(segment);
            if !is_id_shaped(segment, value_type, config) {
                continue;
            }
            let location_key = i
                .checked_sub(1)
                .map(|prev| segments[prev].clone())
                .filter(|prev| !prev.is_empty())
                .unwrap_or_else(|| format!("segment_{}", i));
            sightings.push(Sighting {
                location_type: LocationType::RequestUrlPath,
                location_key: Some(location_key),
                value: segment.clone(),
                value_type,
            });
        }
    }

    for (name, value) in url.query_pairs() {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        let value_type = classify(value);
        let shaped = is_id_shaped(value, value_type, config);
        // short numbers under an id name are still flags, not ids
        let keyed = is_id_key(&name)
            && !(value_type == ValueType::NumericId && !shaped)
            && value_type != ValueType::OauthToken;
        if !shaped && !keyed {
            continue;
        }
        sightings.push(Sighting {
            location_type: LocationType::RequestQueryParam,
            location_key: Some(name.into_owned()),
            value: value.to_string(),
            value_type,
        });
    }

    sightings
}

/// Report every first-seen URL value that is not a known candidate value.
///
/// Usages are searched from the first sighting onward, inclusive, so an
/// orphan always has at least one usage.
pub fn detect_orphans(
    matcher: &UsageMatcher<'_>,
    config: &AnalysisConfig,
    candidate_values: &FxHashSet<&str>,
    names: &mut VariableNames,
) -> Vec<OrphanId> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut orphans = Vec::new();

    for (tx, url) in matcher.parsed_requests() {
        for sighting in url_sightings(url, config) {
            if !seen.insert(sighting.value.clone()) {
                continue;
            }
            if candidate_values.contains(sighting.value.as_str()) {
                continue;
            }

            let usages = matcher.find_usages(&sighting.value, tx.entry_index);
            let parameterization =
                for_orphan(sighting.location_key.as_deref(), usages.len(), names);

            tracing::debug!(
                entry_index = tx.entry_index,
                value = %sighting.value,
                usages = usages.len(),
                "Orphan id"
            );

            orphans.push(OrphanId {
                orphan_id: format!("orphan_{:03}", orphans.len() + 1),
                entry_index: tx.entry_index,
                request_id: tx.request_id.clone(),
                step_label: tx.step_label.clone(),
                url: tx.url.clone(),
                location_type: sighting.location_type,
                location_key: sighting.location_key,
                value: sighting.value,
                value_type: sighting.value_type,
                candidate_type: CandidateType::OrphanId,
                confidence: Confidence::Low,
                usages,
                parameterization,
            });
        }
    }

    orphans
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::correlation::filter::DomainFilter;
    use crate::domain::correlation::types::{Strategy, Transaction};

    const GUID: &str = "11111111-2222-3333-4444-555555555555";

    fn make_tx(entry_index: usize, url: &str) -> Transaction {
        Transaction {
            entry_index,
            step_number: 1,
            step_label: "1 - browse".to_string(),
            request_id: format!("req-{}", entry_index),
            method: "GET".to_string(),
            url: url.to_string(),
            headers: BTreeMap::new(),
            post_data: String::new(),
            response_status: Some(200),
            response_headers: BTreeMap::new(),
            response_body: None,
        }
    }

    fn detect(txs: &[Transaction], known: &[&str]) -> Vec<OrphanId> {
        let config = AnalysisConfig::default();
        let filter = DomainFilter::new(&config);
        let known: FxHashSet<&str> = known.iter().copied().collect();
        let mut names = VariableNames::new();
        let matcher = UsageMatcher::new(txs, &filter, &config);
        detect_orphans(&matcher, &config, &known, &mut names)
    }

    #[test]
    fn test_guid_query_param_is_orphan() {
        let txs = vec![make_tx(0, &format!("https://shop.test/cart?sessionGuid={}", GUID))];
        let orphans = detect(&txs, &[]);

        assert_eq!(orphans.len(), 1);
        let o = &orphans[0];
        assert_eq!(o.value, GUID);
        assert_eq!(o.value_type, ValueType::Guid);
        assert_eq!(o.location_type, LocationType::RequestQueryParam);
        assert_eq!(o.location_key.as_deref(), Some("sessionGuid"));
        assert_eq!(o.candidate_type, CandidateType::OrphanId);
        assert_eq!(o.confidence, Confidence::Low);
        assert_eq!(o.usages.len(), 1);
        assert_eq!(o.parameterization.strategy, Strategy::UserDefinedVariable);
        assert_eq!(o.orphan_id, "orphan_001");
    }

    #[test]
    fn test_numeric_path_segment_is_orphan() {
        let txs = vec![make_tx(0, "https://shop.test/orders/5512/items/7")];
        let orphans = detect(&txs, &[]);

        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].value, "5512");
        assert_eq!(orphans[0].location_type, LocationType::RequestUrlPath);
        assert_eq!(orphans[0].location_key.as_deref(), Some("orders"));
        assert_eq!(orphans[0].parameterization.variable_name, "orders_id");
    }

    #[test]
    fn test_leading_segment_gets_positional_key() {
        let txs = vec![make_tx(0, "https://shop.test/778899/profile")];
        let orphans = detect(&txs, &[]);
        assert_eq!(orphans[0].location_key.as_deref(), Some("segment_0"));
    }

    #[test]
    fn test_id_named_query_param_with_any_value() {
        let txs = vec![make_tx(0, "https://shop.test/p?productId=blue-shirt&page=12&flag_id=1")];
        let orphans = detect(&txs, &[]);
        let values: Vec<_> = orphans.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["blue-shirt", "12"]);
    }

    #[test]
    fn test_known_candidates_are_not_orphans() {
        let txs = vec![make_tx(0, "https://shop.test/orders/987654")];
        assert!(detect(&txs, &["987654"]).is_empty());
    }

    #[test]
    fn test_first_sighting_only_and_recurrence_drives_strategy() {
        let txs = vec![
            make_tx(0, "https://shop.test/home"),
            make_tx(1, "https://shop.test/store/4455/list"),
            make_tx(2, "https://shop.test/store/4455/detail"),
            make_tx(3, "https://shop.test/store/4455/cart"),
        ];
        let orphans = detect(&txs, &[]);

        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].entry_index, 1);
        assert_eq!(orphans[0].usages.len(), 3);
        assert_eq!(orphans[0].parameterization.strategy, Strategy::CsvDataset);
    }

    #[test]
    fn test_excluded_and_unparseable_urls_are_skipped() {
        let txs = vec![
            make_tx(0, "https://www.google-analytics.com/collect?cid=123456789"),
            make_tx(1, "::garbage::"),
        ];
        assert!(detect(&txs, &[]).is_empty());
    }
}
