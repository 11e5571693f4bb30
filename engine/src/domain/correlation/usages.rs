//! Usage Matcher (Stage 3)
//!
//! Finds where a known value reappears in *requests*. Three independent
//! sub-searches run per transaction:
//!
//! 1. **URL**: path segments and decoded query-parameter values
//! 2. **Headers**: every request header except transport plumbing
//! 3. **Body**: JSON bodies are walked leaf by leaf and need an exact match;
//!    anything else falls back to text matching (per field for
//!    form-urlencoded bodies)
//!
//! ## Value Matching
//!
//! Needle and haystack are both expanded into their raw and percent-decoded
//! forms. Needles of at most [`WORD_BOUNDARY_MAX_LEN`] chars must sit on a
//! word boundary (no adjacent alphanumeric), so `"11"` never matches inside a
//! GUID or inside `"110022"`. Longer needles use plain containment.
//!
//! Only transactions at or after `start_index` are searched; callers pass
//! `source.entry_index + 1` to enforce the forward-only rule.
//!
//! Each in-scope request is parsed once into a request view (URL, decoded
//! query pairs, filtered headers, JSON leaves indexed by value or form
//! fields), so a search costs a walk over prepared views instead of a reparse
//! per candidate.

use std::borrow::Cow;

use rustc_hash::FxHashMap;
use serde_json::Value as JsonValue;
use url::Url;

use super::filter::DomainFilter;
use super::types::{LocationType, Transaction, Usage};
use crate::core::config::AnalysisConfig;
use crate::utils::json::{collect_leaves, scalar_to_string};
use crate::utils::string::truncate_preview;
use crate::utils::url::percent_decode;

/// Needles up to this many chars require a word boundary
pub const WORD_BOUNDARY_MAX_LEN: usize = 4;

/// Placeholder for the matched value in location patterns
pub const VALUE_PLACEHOLDER: &str = "{VALUE}";

// ============================================================================
// VALUE MATCHING
// ============================================================================

/// A string in its raw and percent-decoded forms
#[derive(Debug, Clone)]
struct MatchText {
    raw: String,
    decoded: Option<String>,
}

impl MatchText {
    fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let decoded = match percent_decode(&raw) {
            Cow::Owned(decoded) if decoded != raw => Some(decoded),
            _ => None,
        };
        Self { raw, decoded }
    }

    fn decoded(&self) -> &str {
        self.decoded.as_deref().unwrap_or(&self.raw)
    }

    fn forms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.raw.as_str()).chain(self.decoded.as_deref())
    }

    /// Whether `needle` occurs in this text, in any pairing of forms
    fn contains(&self, needle: &MatchText) -> bool {
        if needle.raw.is_empty() || self.raw.is_empty() {
            return false;
        }
        needle
            .forms()
            .filter(|n| !n.is_empty())
            .any(|n| self.forms().any(|h| contains_value(h, n)))
    }
}

fn contains_on_word_boundary(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn contains_value(haystack: &str, needle: &str) -> bool {
    if needle.chars().count() <= WORD_BOUNDARY_MAX_LEN {
        contains_on_word_boundary(haystack, needle)
    } else {
        haystack.contains(needle)
    }
}

/// Whether `needle` occurs in `haystack`, normalization-aware.
pub fn value_matches(needle: &str, haystack: &str) -> bool {
    MatchText::new(haystack).contains(&MatchText::new(needle))
}

// ============================================================================
// REQUEST VIEWS
// ============================================================================

/// A JSON body leaf, pre-rendered for exact comparison
#[derive(Debug)]
struct JsonField {
    key: Option<String>,
    path: String,
    value: String,
    is_string: bool,
}

#[derive(Debug)]
enum RequestBody {
    Empty,
    Json {
        fields: Vec<JsonField>,
        /// Rendered leaf value -> indexes into `fields`, in document order
        by_value: FxHashMap<String, Vec<usize>>,
    },
    Text {
        /// Empty unless the body is form-urlencoded
        form_fields: Vec<(String, MatchText)>,
        text: MatchText,
    },
}

impl RequestBody {
    fn parse(tx: &Transaction, max_json_depth: usize) -> Self {
        let body = tx.post_data.trim();
        if body.is_empty() {
            return Self::Empty;
        }

        // Scalar JSON bodies (`"abc"`, `42`) are treated as text
        if let Ok(document @ (JsonValue::Object(_) | JsonValue::Array(_))) =
            serde_json::from_str::<JsonValue>(body)
        {
            let mut fields = Vec::new();
            let mut by_value: FxHashMap<String, Vec<usize>> = FxHashMap::default();
            for leaf in collect_leaves(&document, max_json_depth) {
                let Some(value) = scalar_to_string(leaf.value) else {
                    continue;
                };
                by_value.entry(value.clone()).or_default().push(fields.len());
                fields.push(JsonField {
                    key: leaf.key.map(String::from),
                    path: leaf.path,
                    value,
                    is_string: leaf.value.is_string(),
                });
            }
            return Self::Json { fields, by_value };
        }

        let form_fields = if looks_form_encoded(tx, body) {
            url::form_urlencoded::parse(body.as_bytes())
                .map(|(name, value)| (name.into_owned(), MatchText::new(value)))
                .collect()
        } else {
            Vec::new()
        };
        Self::Text {
            form_fields,
            text: MatchText::new(body),
        }
    }
}

/// Everything the matcher needs from one in-scope request, parsed once
#[derive(Debug)]
struct RequestView<'a> {
    tx: &'a Transaction,
    url: Option<Url>,
    /// Raw path segments
    segments: Vec<MatchText>,
    /// Decoded query pairs
    query: Vec<(String, MatchText)>,
    /// Request headers minus transport plumbing
    headers: Vec<(&'a str, MatchText)>,
    body: RequestBody,
}

impl<'a> RequestView<'a> {
    fn new(tx: &'a Transaction, config: &AnalysisConfig) -> Self {
        // Unparseable URLs were already reported when the run started
        let url = Url::parse(&tx.url).ok();
        let segments = url
            .as_ref()
            .and_then(|u| u.path_segments())
            .map(|segments| segments.map(MatchText::new).collect())
            .unwrap_or_default();
        let query = url
            .as_ref()
            .map(|u| {
                u.query_pairs()
                    .map(|(name, value)| (name.into_owned(), MatchText::new(value)))
                    .collect()
            })
            .unwrap_or_default();
        let headers = tx
            .headers
            .iter()
            .filter(|(name, _)| !config.is_request_header_denied(name))
            .map(|(name, value)| (name.as_str(), MatchText::new(value.as_str())))
            .collect();

        Self {
            tx,
            url,
            segments,
            query,
            headers,
            body: RequestBody::parse(tx, config.max_json_depth),
        }
    }
}

// ============================================================================
// MATCHER
// ============================================================================

/// Forward scanner over the in-scope requests of one capture.
///
/// Requests are parsed once on construction; every search reuses them.
pub struct UsageMatcher<'a> {
    requests: Vec<RequestView<'a>>,
    config: &'a AnalysisConfig,
}

impl<'a> UsageMatcher<'a> {
    pub fn new(
        transactions: &'a [Transaction],
        filter: &DomainFilter,
        config: &'a AnalysisConfig,
    ) -> Self {
        let mut requests: Vec<RequestView<'a>> = transactions
            .iter()
            .filter(|tx| !filter.is_excluded(&tx.url))
            .map(|tx| RequestView::new(tx, config))
            .collect();
        requests.sort_by_key(|r| r.tx.entry_index);

        tracing::trace!(
            total = transactions.len(),
            in_scope = requests.len(),
            "Request views built"
        );

        Self { requests, config }
    }

    /// In-scope requests with a parseable URL, in entry order
    pub fn parsed_requests(&self) -> impl Iterator<Item = (&'a Transaction, &Url)> + '_ {
        self.requests
            .iter()
            .filter_map(|r| r.url.as_ref().map(|url| (r.tx, url)))
    }

    /// Every usage of `value` in in-scope requests with
    /// `entry_index >= start_index`, in discovery order.
    pub fn find_usages(&self, value: &str, start_index: usize) -> Vec<Usage> {
        let mut usages = Vec::new();
        if value.trim().is_empty() {
            return usages;
        }

        let needle = MatchText::new(value);
        let first = self
            .requests
            .partition_point(|r| r.tx.entry_index < start_index);

        for request in &self.requests[first..] {
            self.match_url(request, &needle, &mut usages);
            self.match_headers(request, &needle, &mut usages);
            self.match_body(request, &needle, &mut usages);
        }

        usages
    }

    fn usage(
        &self,
        tx: &Transaction,
        location_type: LocationType,
        location_key: Option<String>,
        location_json_path: Option<String>,
        location_pattern: String,
        example: &str,
    ) -> Usage {
        Usage {
            entry_index: tx.entry_index,
            request_id: tx.request_id.clone(),
            step_label: tx.step_label.clone(),
            method: tx.method.clone(),
            url: tx.url.clone(),
            location_type,
            location_key,
            location_json_path,
            location_pattern,
            example: truncate_preview(example, self.config.example_max_length),
        }
    }

    // ------------------------------------------------------------------------
    // URL
    // ------------------------------------------------------------------------

    fn match_url(&self, request: &RequestView<'_>, needle: &MatchText, usages: &mut Vec<Usage>) {
        let Some(url) = &request.url else {
            return;
        };
        let value = needle.raw.as_str();

        for (i, segment) in request.segments.iter().enumerate() {
            if !segment.contains(needle) {
                continue;
            }
            let pattern_segment = if segment.raw.contains(value) {
                segment.raw.replacen(value, VALUE_PLACEHOLDER, 1)
            } else {
                VALUE_PLACEHOLDER.to_string()
            };
            let pattern = request
                .segments
                .iter()
                .enumerate()
                .map(|(j, s)| if i == j { pattern_segment.as_str() } else { s.raw.as_str() })
                .collect::<Vec<_>>()
                .join("/");
            let key = i
                .checked_sub(1)
                .map(|prev| request.segments[prev].decoded().to_string())
                .filter(|prev| !prev.is_empty());
            usages.push(self.usage(
                request.tx,
                LocationType::RequestUrlPath,
                key,
                None,
                format!("/{}", pattern),
                url.path(),
            ));
        }

        for (name, param_value) in &request.query {
            if !param_value.contains(needle) {
                continue;
            }
            usages.push(self.usage(
                request.tx,
                LocationType::RequestQueryParam,
                Some(name.clone()),
                None,
                format!("{}={}", name, VALUE_PLACEHOLDER),
                &format!("{}={}", name, param_value.raw),
            ));
        }
    }

    // ------------------------------------------------------------------------
    // HEADERS
    // ------------------------------------------------------------------------

    fn match_headers(
        &self,
        request: &RequestView<'_>,
        needle: &MatchText,
        usages: &mut Vec<Usage>,
    ) {
        for (name, header_value) in &request.headers {
            if !header_value.contains(needle) {
                continue;
            }
            usages.push(self.usage(
                request.tx,
                LocationType::RequestHeader,
                Some(name.to_string()),
                None,
                format!("{}: {}", name, VALUE_PLACEHOLDER),
                &format!("{}: {}", name, header_value.raw),
            ));
        }
    }

    // ------------------------------------------------------------------------
    // BODY
    // ------------------------------------------------------------------------

    fn match_body(&self, request: &RequestView<'_>, needle: &MatchText, usages: &mut Vec<Usage>) {
        match &request.body {
            RequestBody::Empty => {}
            RequestBody::Json { fields, by_value } => {
                // exact equality only: substring hits inside JSON strings are noise
                let Some(indexes) = by_value.get(needle.raw.as_str()) else {
                    return;
                };
                for field in indexes.iter().map(|&i| &fields[i]) {
                    let key = field.key.as_deref().unwrap_or("$");
                    let pattern = if field.is_string {
                        format!("\"{}\": \"{}\"", key, VALUE_PLACEHOLDER)
                    } else {
                        format!("\"{}\": {}", key, VALUE_PLACEHOLDER)
                    };
                    let example = format!("{} = {}", field.path, field.value);
                    usages.push(self.usage(
                        request.tx,
                        LocationType::RequestBodyJson,
                        field.key.clone(),
                        Some(field.path.clone()),
                        pattern,
                        &example,
                    ));
                }
            }
            RequestBody::Text { form_fields, text } => {
                let before = usages.len();
                for (name, field_value) in form_fields {
                    if !field_value.contains(needle) {
                        continue;
                    }
                    usages.push(self.usage(
                        request.tx,
                        LocationType::RequestBodyText,
                        Some(name.clone()),
                        None,
                        format!("{}={}", name, VALUE_PLACEHOLDER),
                        &format!("{}={}", name, field_value.raw),
                    ));
                }
                if usages.len() > before {
                    return;
                }

                if text.contains(needle) {
                    usages.push(self.usage(
                        request.tx,
                        LocationType::RequestBodyText,
                        None,
                        None,
                        VALUE_PLACEHOLDER.to_string(),
                        fragment_around(&text.raw, &needle.raw),
                    ));
                }
            }
        }
    }
}

fn looks_form_encoded(tx: &Transaction, body: &str) -> bool {
    if let Some(content_type) = tx.request_header("content-type") {
        return content_type
            .to_ascii_lowercase()
            .contains("application/x-www-form-urlencoded");
    }
    body.contains('=') && !body.chars().any(char::is_whitespace)
}

/// Slice of `body` starting shortly before the first occurrence of `value`
fn fragment_around<'b>(body: &'b str, value: &str) -> &'b str {
    let Some(pos) = body.find(value) else {
        return body;
    };
    let mut start = pos.saturating_sub(20);
    while start > 0 && !body.is_char_boundary(start) {
        start -= 1;
    }
    &body[start..]
}

#[cfg(test)]
#[path = "usages_tests.rs"]
mod tests;
