//! Source Extractor (Stage 2)
//!
//! Scans each in-scope transaction's *response* for values worth tracking.
//!
//! ## Extraction Sources
//!
//! | Source          | Trigger                                              | Candidate type     |
//! |-----------------|------------------------------------------------------|--------------------|
//! | Response header | name ends in an ID suffix, not a structural header   | `correlation-id`   |
//! | Redirect target | `Location` query param is ID-like or an OAuth param  | `business-id` / `oauth-param` |
//! | JSON body       | ID-shaped key with an ID-like primitive value        | `business-id`      |
//! | Cookies         | never (handled by the replay tool's cookie manager)  | -                  |
//!
//! Each transaction is examined in isolation. Cross-transaction logic lives
//! in [`dedup_candidates`]: a value is attributed to exactly one source, the
//! earliest one.

use rustc_hash::FxHashMap;
use serde_json::Value as JsonValue;

use super::classify::{ValueType, classify, is_id_key, is_id_like};
use super::filter::DomainFilter;
use super::types::{
    Candidate, CandidateType, Diagnostic, DiagnosticKind, SourceLocation, Transaction,
};
use crate::core::config::AnalysisConfig;
use crate::utils::json::{collect_leaves, scalar_to_string};
use crate::utils::url::resolve_location;

const LOCATION_HEADER: &str = "location";
const CONTENT_TYPE_HEADER: &str = "content-type";

// ============================================================================
// CANDIDATE CONSTRUCTION
// ============================================================================

fn candidate(
    tx: &Transaction,
    source_location: SourceLocation,
    source_key: &str,
    source_json_path: Option<String>,
    value: String,
    candidate_type: CandidateType,
) -> Candidate {
    Candidate {
        entry_index: tx.entry_index,
        request_id: tx.request_id.clone(),
        step_label: tx.step_label.clone(),
        url: tx.url.clone(),
        source_location,
        source_key: source_key.to_string(),
        source_json_path,
        value_type: classify(&value),
        value,
        candidate_type,
    }
}

// ============================================================================
// PER-SOURCE EXTRACTORS
// ============================================================================

/// Response headers named like identifiers (`X-Request-Id`, `X-Trace-Uuid`).
/// JWT-shaped values are skipped.
fn header_candidates(tx: &Transaction, config: &AnalysisConfig) -> Vec<Candidate> {
    tx.response_headers
        .iter()
        .filter_map(|(name, value)| {
            let lower = name.to_ascii_lowercase();
            if config.response_header_denylist.iter().any(|d| *d == lower) {
                return None;
            }
            if !config.id_header_suffixes.iter().any(|s| lower.ends_with(s.as_str())) {
                return None;
            }
            let value = value.trim();
            // bearer-style tokens are flagged by the classifier, never extracted
            if value.is_empty() || classify(value) == ValueType::OauthToken {
                return None;
            }
            Some(candidate(
                tx,
                SourceLocation::ResponseHeader,
                name,
                None,
                value.to_string(),
                CandidateType::CorrelationId,
            ))
        })
        .collect()
}

/// Query parameters of a `Location` redirect target
fn redirect_candidates(
    tx: &Transaction,
    config: &AnalysisConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Candidate> {
    let Some(location) = tx.response_header(LOCATION_HEADER) else {
        return Vec::new();
    };
    let target = match resolve_location(&tx.url, location.trim()) {
        Ok(target) => target,
        Err(e) => {
            tracing::debug!(entry_index = tx.entry_index, location, error = %e, "Unparseable redirect target");
            diagnostics.push(Diagnostic::for_entry(
                DiagnosticKind::MalformedUrl,
                tx.entry_index,
                format!("redirect target {:?}: {}", location, e),
            ));
            return Vec::new();
        }
    };

    target
        .query_pairs()
        .filter_map(|(name, value)| {
            if value.is_empty() {
                return None;
            }
            let candidate_type = if config.is_oauth_param(&name) {
                CandidateType::OauthParam
            } else if is_id_like(&value, config.min_numeric_id_digits) {
                CandidateType::BusinessId
            } else {
                return None;
            };
            Some(candidate(
                tx,
                SourceLocation::ResponseRedirectUrl,
                &name,
                None,
                value.into_owned(),
                candidate_type,
            ))
        })
        .collect()
}

/// Whether a response should be parsed as JSON
fn is_json_response(tx: &Transaction, body: &str) -> bool {
    match tx.response_header(CONTENT_TYPE_HEADER) {
        Some(content_type) => content_type.to_ascii_lowercase().contains("json"),
        None => {
            let trimmed = body.trim_start();
            trimmed.starts_with('{') || trimmed.starts_with('[')
        }
    }
}

/// ID-keyed primitives inside a JSON response body
fn json_body_candidates(
    tx: &Transaction,
    config: &AnalysisConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Candidate> {
    let Some(body) = tx.response_body.as_deref().filter(|b| !b.trim().is_empty()) else {
        return Vec::new();
    };
    if !is_json_response(tx, body) {
        return Vec::new();
    }
    let document: JsonValue = match serde_json::from_str(body) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!(entry_index = tx.entry_index, error = %e, "Skipping unparseable JSON response");
            diagnostics.push(Diagnostic::for_entry(
                DiagnosticKind::MalformedJsonBody,
                tx.entry_index,
                format!("response body: {}", e),
            ));
            return Vec::new();
        }
    };

    collect_leaves(&document, config.max_json_depth)
        .into_iter()
        .filter_map(|leaf| {
            let key = leaf.key?;
            if !is_id_key(key) {
                return None;
            }
            // strings and numbers only; booleans and nulls are never identifiers
            let value = match leaf.value {
                JsonValue::String(_) | JsonValue::Number(_) => scalar_to_string(leaf.value)?,
                _ => return None,
            };
            let value = value.trim().to_string();
            if !is_id_like(&value, config.min_numeric_id_digits)
                || classify(&value) == ValueType::OauthToken
            {
                return None;
            }
            Some(candidate(
                tx,
                SourceLocation::ResponseJsonBody,
                key,
                Some(leaf.path),
                value,
                CandidateType::BusinessId,
            ))
        })
        .collect()
}

/// Cookies are replayed by the load tool's own cookie manager. Only
/// cross-domain cookie hand-offs would need extraction, and none are handled.
fn cookie_candidates(_tx: &Transaction) -> Vec<Candidate> {
    Vec::new()
}

// ============================================================================
// STAGE ENTRY POINTS
// ============================================================================

/// Extract candidates from every in-scope transaction, in entry order.
///
/// The result is not deduplicated.
pub fn extract_candidates(
    transactions: &[Transaction],
    filter: &DomainFilter,
    config: &AnalysisConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for tx in transactions.iter().filter(|tx| !filter.is_excluded(&tx.url)) {
        let before = candidates.len();
        candidates.extend(header_candidates(tx, config));
        candidates.extend(redirect_candidates(tx, config, diagnostics));
        candidates.extend(json_body_candidates(tx, config, diagnostics));
        candidates.extend(cookie_candidates(tx));

        let found = candidates.len() - before;
        if found > 0 {
            tracing::trace!(entry_index = tx.entry_index, found, "Extracted candidates");
        }
    }

    candidates
}

/// Keep one candidate per value: the one with the smallest `entry_index`.
///
/// Ties within a transaction keep the first emitted candidate. Output order
/// is the order in which each surviving value was first seen.
pub fn dedup_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut by_value: FxHashMap<String, usize> = FxHashMap::default();
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        match by_value.get(&candidate.value) {
            Some(&slot) => {
                if candidate.entry_index < kept[slot].entry_index {
                    kept[slot] = candidate;
                }
            }
            None => {
                by_value.insert(candidate.value.clone(), kept.len());
                kept.push(candidate);
            }
        }
    }

    kept
}

#[cfg(test)]
#[path = "sources_tests.rs"]
mod tests;
