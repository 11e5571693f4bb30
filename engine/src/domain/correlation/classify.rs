//! Value Classification
//!
//! Coarse typing of raw values seen in captured traffic. The rules are a
//! prioritized list; the first matching rule decides the [`ValueType`]:
//!
//! | Priority | Rule                                            | Result        |
//! |----------|-------------------------------------------------|---------------|
//! | 1        | all ASCII digits                                | `numeric-id`  |
//! | 2        | canonical 8-4-4-4-12 hex with dashes            | `guid`        |
//! | 3        | three dot-separated base64url segments (JWT)    | `oauth-token` |
//! | 4        | longer than 20 chars and fully alphanumeric     | `opaque-id`   |
//! | 5        | anything else                                   | `string-id`   |
//!
//! Non-scalar JSON input (objects, arrays, null) classifies as `unknown`.
//!
//! [`is_id_like`] is the companion noise filter used to keep trivial values
//! (`"1"`, `"true"`, short words) out of the candidate set.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Length above which a fully alphanumeric value is considered opaque
const OPAQUE_MIN_LENGTH: usize = 20;

/// Length bounds for generic token-shaped identifiers
const TOKEN_MIN_LENGTH: usize = 8;
const TOKEN_MAX_LENGTH: usize = 128;

// ============================================================================
// VALUE TYPE
// ============================================================================

/// Coarse classification of a raw value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueType {
    NumericId,
    Guid,
    /// JWT-shaped token. Flagged, never auto-extracted as a plain correlation.
    OauthToken,
    OpaqueId,
    StringId,
    Unknown,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NumericId => "numeric-id",
            Self::Guid => "guid",
            Self::OauthToken => "oauth-token",
            Self::OpaqueId => "opaque-id",
            Self::StringId => "string-id",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// PATTERNS
// ============================================================================

fn guid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
        )
        .expect("Invalid regex")
    })
}

/// Segments must be at least 4 chars so version strings like `1.2.3` stay out.
fn jwt_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_-]{4,}\.[A-Za-z0-9_-]{4,}\.[A-Za-z0-9_-]{4,}$")
            .expect("Invalid regex")
    })
}

fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_guid(value: &str) -> bool {
    guid_regex().is_match(value)
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Classify a string value. Leading/trailing whitespace is ignored.
pub fn classify(value: &str) -> ValueType {
    let value = value.trim();

    if is_all_digits(value) {
        return ValueType::NumericId;
    }
    if is_guid(value) {
        return ValueType::Guid;
    }
    if jwt_regex().is_match(value) {
        return ValueType::OauthToken;
    }
    if value.len() > OPAQUE_MIN_LENGTH && value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return ValueType::OpaqueId;
    }
    ValueType::StringId
}

/// Classify a JSON value. Numbers are classified by their decimal form.
pub fn classify_json(value: &JsonValue) -> ValueType {
    match value {
        JsonValue::String(s) => classify(s),
        JsonValue::Number(n) => classify(&n.to_string()),
        JsonValue::Bool(b) => classify(if *b { "true" } else { "false" }),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => ValueType::Unknown,
    }
}

/// Whether a value is shaped like an identifier worth tracking.
///
/// - numeric strings need at least `min_numeric_digits` digits
/// - GUIDs always pass
/// - alphanumeric tokens (with `-`/`_`) of 8..=128 chars pass
pub fn is_id_like(value: &str, min_numeric_digits: usize) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }
    if is_all_digits(value) {
        return value.len() >= min_numeric_digits;
    }
    if is_guid(value) {
        return true;
    }
    (TOKEN_MIN_LENGTH..=TOKEN_MAX_LENGTH).contains(&value.len())
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Whether an object key or parameter name names an identifier.
///
/// Matches `id`, `uuid`, `guid` exactly (any case), `*_id` / `*-id` (any case),
/// camelCase `*Id` / `*ID`, and `*uuid` / `*guid` suffixes.
pub fn is_id_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    if matches!(lower.as_str(), "id" | "uuid" | "guid") {
        return true;
    }
    if lower.ends_with("_id") || lower.ends_with("-id") {
        return true;
    }
    if lower.ends_with("uuid") || lower.ends_with("guid") {
        return true;
    }
    // camelCase: "orderId", "userID" but not "paid" or "valid"
    if let Some(stem) = key.strip_suffix("Id").or_else(|| key.strip_suffix("ID")) {
        return stem
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    }
    false
}
