//! Parameterization Classifier
//!
//! Decides how the script generator should supply each value at replay time.
//!
//! | Known source | Usage count | Strategy                |
//! |--------------|-------------|-------------------------|
//! | yes          | any         | `extract-and-reuse`     |
//! | no           | >= 3        | `csv-dataset`           |
//! | no           | 0-2         | `user-defined-variable` |
//!
//! Extract-and-reuse decisions also carry an [`ExtractorHint`] derived from
//! where the source was observed, and every decision gets a unique
//! snake_case variable name.

use rustc_hash::{FxHashMap, FxHashSet};

use super::classify::ValueType;
use super::types::{
    Candidate, CandidateType, Confidence, ExtractorHint, ExtractorKind, ExtractorScope,
    Parameterization, SourceLocation, Strategy,
};
use crate::utils::json::to_json_path;
use crate::utils::string::to_snake_case;

/// Sourceless values recurring at least this often become a dataset
pub const CSV_DATASET_MIN_USAGES: usize = 3;

/// Numeric ids this short collide easily across unrelated records
const SHORT_NUMERIC_ID_MAX_DIGITS: usize = 4;

const GENERIC_ID_NAMES: &[&str] = &["id", "uuid", "guid"];
const FALLBACK_VARIABLE_NAME: &str = "value";

// ============================================================================
// DECISION TABLE
// ============================================================================

/// Strategy for a value, from whether a source exists and how often it recurs
pub fn decide(has_source: bool, usage_count: usize) -> Strategy {
    match (has_source, usage_count) {
        (true, _) => Strategy::ExtractAndReuse,
        (false, n) if n >= CSV_DATASET_MIN_USAGES => Strategy::CsvDataset,
        (false, _) => Strategy::UserDefinedVariable,
    }
}

/// Confidence of a correlation, from its source candidate
pub fn confidence_for(candidate: &Candidate) -> Confidence {
    if candidate.candidate_type == CandidateType::OauthParam
        || candidate.source_location == SourceLocation::ResponseRedirectUrl
    {
        return Confidence::Medium;
    }
    if candidate.value_type == ValueType::NumericId
        && candidate.value.len() <= SHORT_NUMERIC_ID_MAX_DIGITS
    {
        return Confidence::Medium;
    }
    Confidence::High
}

/// Extractor the script generator should build for a source
pub fn extractor_for(candidate: &Candidate) -> ExtractorHint {
    match candidate.source_location {
        SourceLocation::ResponseJsonBody => ExtractorHint {
            kind: ExtractorKind::JsonPath,
            scope: ExtractorScope::Body,
            expression: to_json_path(
                candidate
                    .source_json_path
                    .as_deref()
                    .unwrap_or(&candidate.source_key),
            ),
        },
        SourceLocation::ResponseHeader => ExtractorHint {
            kind: ExtractorKind::Regex,
            scope: ExtractorScope::Headers,
            expression: format!(
                r"(?im)^{}:\s*(.+?)\s*$",
                regex::escape(&candidate.source_key)
            ),
        },
        SourceLocation::ResponseRedirectUrl => ExtractorHint {
            kind: ExtractorKind::Regex,
            scope: ExtractorScope::Headers,
            expression: format!(r"[?&]{}=([^&#]+)", regex::escape(&candidate.source_key)),
        },
    }
}

// ============================================================================
// VARIABLE NAMES
// ============================================================================

/// Hands out unique variable names within one run (`order_id`, `order_id_2`)
#[derive(Debug, Default)]
pub struct VariableNames {
    taken: FxHashSet<String>,
    next_suffix: FxHashMap<String, usize>,
}

impl VariableNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `base`, or `base_N` for the smallest free N >= 2
    pub fn allocate(&mut self, base: &str) -> String {
        let base = if base.is_empty() {
            FALLBACK_VARIABLE_NAME
        } else {
            base
        };
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = self.next_suffix.get(base).copied().unwrap_or(2);
        loop {
            let name = format!("{}_{}", base, n);
            n += 1;
            if self.taken.insert(name.clone()) {
                self.next_suffix.insert(base.to_string(), n);
                return name;
            }
        }
    }
}

/// Last key of the container holding a JSON leaf (`order` for `order.id`)
fn parent_key(json_path: &str) -> Option<&str> {
    let (parent, _) = json_path.rsplit_once('.')?;
    let parent = parent.rsplit('.').next()?;
    let parent = parent.split('[').next()?;
    Some(parent.trim_matches(|c| c == '"')).filter(|p| !p.is_empty())
}

/// Variable base name for a correlation source
pub fn source_variable_base(candidate: &Candidate) -> String {
    let key = to_snake_case(&candidate.source_key);
    let key = match candidate.source_location {
        SourceLocation::ResponseHeader => key
            .strip_prefix("x_")
            .filter(|rest| !rest.is_empty())
            .map(String::from)
            .unwrap_or(key),
        _ => key,
    };

    if GENERIC_ID_NAMES.contains(&key.as_str())
        && let Some(parent) = candidate.source_json_path.as_deref().and_then(parent_key)
    {
        let parent = to_snake_case(parent);
        if !parent.is_empty() {
            return format!("{}_{}", parent, key);
        }
    }
    key
}

/// Variable base name for an orphan found under `location_key`
pub fn orphan_variable_base(location_key: Option<&str>) -> String {
    let key = location_key.map(to_snake_case).unwrap_or_default();
    if key.is_empty() {
        return "orphan_id".to_string();
    }
    if GENERIC_ID_NAMES.iter().any(|s| key.ends_with(s)) {
        key
    } else {
        format!("{}_id", key)
    }
}

// ============================================================================
// DECISIONS
// ============================================================================

/// Parameterization for a value with a known response source
pub fn for_correlation(
    candidate: &Candidate,
    usage_count: usize,
    names: &mut VariableNames,
) -> Parameterization {
    let strategy = decide(true, usage_count);
    Parameterization {
        strategy,
        variable_name: names.allocate(&source_variable_base(candidate)),
        extractor: Some(extractor_for(candidate)),
        reason: format!(
            "extracted from {} `{}` in {}, reused in {} later request(s)",
            candidate.source_location.as_str(),
            candidate.source_key,
            candidate.request_id,
            usage_count
        ),
    }
}

/// Parameterization for a request value with no identified source
pub fn for_orphan(
    location_key: Option<&str>,
    usage_count: usize,
    names: &mut VariableNames,
) -> Parameterization {
    let strategy = decide(false, usage_count);
    let reason = match strategy {
        Strategy::CsvDataset => format!(
            "no response source; value recurs in {} requests, supply per-user values from a dataset",
            usage_count
        ),
        _ => format!(
            "no response source; value appears in {} request(s), define it as a script variable",
            usage_count
        ),
    };
    Parameterization {
        strategy,
        variable_name: names.allocate(&orphan_variable_base(location_key)),
        extractor: None,
        reason,
    }
}
