//! Entry Normalizer (Stage 1)
//!
//! Flattens the step-grouped capture into one chronologically ordered list of
//! [`Transaction`]s and assigns `entry_index`, the only ordering primitive
//! used downstream.
//!
//! ## Ordering
//!
//! Stable sort on `(step_number, step order in document, position in step)`.
//! `step_number` comes from the record itself, else from a numeric prefix in
//! the step label (`"03 - checkout"`, `"Step 3: checkout"`, `"step_3"`),
//! else `0`.
//!
//! Records are validated here: a record without a URL cannot be replayed
//! and is reported as [`DiagnosticKind::MalformedRecord`] before indexing,
//! so indexes stay contiguous. Content is otherwise carried over untouched.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::capture::Capture;
use super::types::{Diagnostic, DiagnosticKind, Transaction};
use crate::utils::json::{scalar_to_string, type_name, value_to_text};

/// Raw record as written by the recorder. Every field is optional here;
/// required fields are checked when building the [`Transaction`].
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTransaction {
    request_id: Option<JsonValue>,
    method: Option<String>,
    url: Option<String>,
    #[serde(alias = "request_headers")]
    headers: Option<JsonValue>,
    #[serde(alias = "request_body")]
    post_data: Option<JsonValue>,
    #[serde(alias = "status")]
    response_status: Option<JsonValue>,
    response_headers: Option<JsonValue>,
    response_body: Option<JsonValue>,
    step_number: Option<JsonValue>,
    step_label: Option<String>,
}

/// A validated record waiting for its global index
struct PendingEntry {
    step_number: u32,
    step_order: usize,
    position: usize,
    step_label: String,
    url: String,
    raw: RawTransaction,
}

fn step_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(?:step)?[\s_#:.\-]*(\d+)").expect("Invalid regex"))
}

/// Parse a numeric prefix out of a step label
pub fn parse_step_number(label: &str) -> Option<u32> {
    step_number_regex()
        .captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn json_to_u32(value: &JsonValue) -> Option<u32> {
    match value {
        JsonValue::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn json_to_status(value: &JsonValue) -> Option<u16> {
    match value {
        JsonValue::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn body_to_string(value: Option<&JsonValue>) -> Option<String> {
    match value {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// Parse a header set given either as an object or as a HAR-style list of
/// `{name, value}` entries. Repeated names are joined with `", "`.
pub fn parse_headers(value: Option<&JsonValue>) -> Result<BTreeMap<String, String>, String> {
    let mut headers = BTreeMap::new();
    match value {
        None | Some(JsonValue::Null) => {}
        Some(JsonValue::Object(map)) => {
            for (name, v) in map {
                headers.insert(name.clone(), value_to_text(v));
            }
        }
        Some(JsonValue::Array(entries)) => {
            for entry in entries {
                let Some(name) = entry.get("name").and_then(JsonValue::as_str) else {
                    return Err(format!(
                        "header entry without a name: {}",
                        value_to_text(entry)
                    ));
                };
                let v = entry.get("value").map(value_to_text).unwrap_or_default();
                headers
                    .entry(name.to_string())
                    .and_modify(|existing: &mut String| {
                        existing.push_str(", ");
                        existing.push_str(&v);
                    })
                    .or_insert(v);
            }
        }
        Some(other) => {
            return Err(format!(
                "expected an object or a list of headers, got {}",
                type_name(other)
            ));
        }
    }
    Ok(headers)
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Flatten and order a capture. Skipped fragments are appended to
/// `diagnostics`.
pub fn normalize_capture(capture: &Capture, diagnostics: &mut Vec<Diagnostic>) -> Vec<Transaction> {
    let mut pending = Vec::new();

    for (step_order, step) in capture.steps.iter().enumerate() {
        let JsonValue::Array(records) = &step.records else {
            tracing::debug!(step = %step.label, "Skipping step that is not a list");
            diagnostics.push(Diagnostic::for_step(
                DiagnosticKind::MalformedStep,
                &step.label,
                format!("expected a list of transactions, got {}", type_name(&step.records)),
            ));
            continue;
        };

        let label_number = parse_step_number(&step.label);

        for (position, record) in records.iter().enumerate() {
            let raw = match RawTransaction::deserialize(record) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::debug!(step = %step.label, position, error = %e, "Skipping malformed record");
                    diagnostics.push(Diagnostic::for_step(
                        DiagnosticKind::MalformedRecord,
                        &step.label,
                        format!("record {}: {}", position, e),
                    ));
                    continue;
                }
            };

            let url = match raw.url.as_deref().map(str::trim) {
                Some(url) if !url.is_empty() => url.to_string(),
                _ => {
                    tracing::debug!(step = %step.label, position, "Skipping record without url");
                    diagnostics.push(Diagnostic::for_step(
                        DiagnosticKind::MalformedRecord,
                        &step.label,
                        format!("record {}: missing url", position),
                    ));
                    continue;
                }
            };

            let step_number = raw
                .step_number
                .as_ref()
                .and_then(json_to_u32)
                .or(label_number)
                .unwrap_or(0);

            pending.push(PendingEntry {
                step_number,
                step_order,
                position,
                step_label: raw.step_label.clone().unwrap_or_else(|| step.label.clone()),
                url,
                raw,
            });
        }
    }

    pending.sort_by_key(|p| (p.step_number, p.step_order, p.position));

    pending
        .into_iter()
        .enumerate()
        .map(|(entry_index, entry)| build_transaction(entry_index, entry, diagnostics))
        .collect()
}

fn build_transaction(
    entry_index: usize,
    entry: PendingEntry,
    diagnostics: &mut Vec<Diagnostic>,
) -> Transaction {
    let raw = entry.raw;

    let mut header_set = |value: Option<&JsonValue>, side: &str| {
        parse_headers(value).unwrap_or_else(|e| {
            tracing::debug!(entry_index, side, error = %e, "Ignoring malformed headers");
            diagnostics.push(Diagnostic::for_entry(
                DiagnosticKind::MalformedHeaders,
                entry_index,
                format!("{} headers: {}", side, e),
            ));
            BTreeMap::new()
        })
    };
    let headers = header_set(raw.headers.as_ref(), "request");
    let response_headers = header_set(raw.response_headers.as_ref(), "response");

    let request_id = raw
        .request_id
        .as_ref()
        .and_then(scalar_to_string)
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("entry-{}", entry_index));

    let method = raw
        .method
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_ascii_uppercase)
        .unwrap_or_else(|| "GET".to_string());

    Transaction {
        entry_index,
        step_number: entry.step_number,
        step_label: entry.step_label,
        request_id,
        method,
        url: entry.url,
        headers,
        post_data: body_to_string(raw.post_data.as_ref()).unwrap_or_default(),
        response_status: raw.response_status.as_ref().and_then(json_to_status),
        response_headers,
        response_body: body_to_string(raw.response_body.as_ref()),
    }
}
