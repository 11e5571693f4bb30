//! Correlation data model.
//!
//! Pipeline intermediates ([`Transaction`], [`Candidate`], [`Usage`]) and the
//! externally consumed output ([`Correlation`], [`OrphanId`],
//! [`CorrelationSpec`]). Everything is built once and never mutated after
//! the pipeline stage that produces it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classify::ValueType;

// ============================================================================
// STRONGLY TYPED ENUMS
// ============================================================================

/// Where in a response a candidate value was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceLocation {
    ResponseHeader,
    ResponseRedirectUrl,
    ResponseJsonBody,
}

impl SourceLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResponseHeader => "response-header",
            Self::ResponseRedirectUrl => "response-redirect-url",
            Self::ResponseJsonBody => "response-json-body",
        }
    }
}

/// What kind of value a candidate represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateType {
    BusinessId,
    CorrelationId,
    OauthParam,
    OrphanId,
}

impl CandidateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BusinessId => "business-id",
            Self::CorrelationId => "correlation-id",
            Self::OauthParam => "oauth-param",
            Self::OrphanId => "orphan-id",
        }
    }
}

impl std::fmt::Display for CandidateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where in a request a value reappeared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocationType {
    RequestUrlPath,
    RequestQueryParam,
    RequestHeader,
    RequestBodyJson,
    RequestBodyText,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestUrlPath => "request-url-path",
            Self::RequestQueryParam => "request-query-param",
            Self::RequestHeader => "request-header",
            Self::RequestBodyJson => "request-body-json",
            Self::RequestBodyText => "request-body-text",
        }
    }
}

/// How much a reviewer should trust a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// How the script generator should supply a value at replay time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    ExtractAndReuse,
    CsvDataset,
    UserDefinedVariable,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractAndReuse => "extract-and-reuse",
            Self::CsvDataset => "csv-dataset",
            Self::UserDefinedVariable => "user-defined-variable",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extractor family the script generator should emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractorKind {
    JsonPath,
    Regex,
}

/// Part of the response an extractor reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractorScope {
    Body,
    Headers,
}

// ============================================================================
// PIPELINE ENTITIES
// ============================================================================

/// One captured request/response pair with its global position.
///
/// Header maps keep the captured name casing; use the `*_header` accessors
/// for case-insensitive lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub entry_index: usize,
    pub step_number: u32,
    pub step_label: String,
    pub request_id: String,
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub post_data: String,
    pub response_status: Option<u16>,
    pub response_headers: BTreeMap<String, String>,
    pub response_body: Option<String>,
}

impl Transaction {
    /// Case-insensitive response header lookup
    pub fn response_header(&self, name: &str) -> Option<&str> {
        find_header(&self.response_headers, name)
    }

    /// Case-insensitive request header lookup
    pub fn request_header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// A response value that might need to be correlated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub entry_index: usize,
    pub request_id: String,
    pub step_label: String,
    pub url: String,
    pub source_location: SourceLocation,
    pub source_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_json_path: Option<String>,
    pub value: String,
    pub value_type: ValueType,
    pub candidate_type: CandidateType,
}

/// A reappearance of a known value in a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub entry_index: usize,
    pub request_id: String,
    pub step_label: String,
    pub method: String,
    pub url: String,
    pub location_type: LocationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_json_path: Option<String>,
    pub location_pattern: String,
    pub example: String,
}

// ============================================================================
// OUTPUT
// ============================================================================

/// Extractor the script generator should build for an extract-and-reuse value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorHint {
    pub kind: ExtractorKind,
    pub scope: ExtractorScope,
    pub expression: String,
}

/// Replay strategy decision for a correlation or orphan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameterization {
    pub strategy: Strategy,
    pub variable_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extractor: Option<ExtractorHint>,
    pub reason: String,
}

/// A candidate with at least one later usage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correlation {
    pub correlation_id: String,
    #[serde(rename = "type")]
    pub correlation_type: CandidateType,
    pub value_type: ValueType,
    pub confidence: Confidence,
    pub source: Candidate,
    pub usages: Vec<Usage>,
    pub parameterization: Parameterization,
}

/// An ID-shaped request value with no identified source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanId {
    pub orphan_id: String,
    pub entry_index: usize,
    pub request_id: String,
    pub step_label: String,
    pub url: String,
    pub location_type: LocationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_key: Option<String>,
    pub value: String,
    pub value_type: ValueType,
    pub candidate_type: CandidateType,
    pub confidence: Confidence,
    /// Request occurrences from the first sighting onward (inclusive)
    pub usages: Vec<Usage>,
    pub parameterization: Parameterization,
}

/// Capture-level facts recorded alongside the findings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub engine_version: String,
    pub step_count: usize,
    pub total_transactions: usize,
    pub analyzed_transactions: usize,
    pub excluded_transactions: usize,
    pub skipped_fragments: usize,
}

/// Summary counters over a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub total_correlations: usize,
    pub total_usages: usize,
    pub total_orphans: usize,
    pub by_type: BTreeMap<CandidateType, usize>,
    pub by_confidence: BTreeMap<Confidence, usize>,
    pub by_strategy: BTreeMap<Strategy, usize>,
}

/// Top-level analysis output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationSpec {
    pub metadata: CaptureMetadata,
    pub correlations: Vec<Correlation>,
    pub summary: CorrelationSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orphan_ids: Option<Vec<OrphanId>>,
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

/// Kind of input fragment that was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    MalformedStep,
    MalformedRecord,
    MalformedUrl,
    MalformedHeaders,
    MalformedJsonBody,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedStep => "malformed-step",
            Self::MalformedRecord => "malformed-record",
            Self::MalformedUrl => "malformed-url",
            Self::MalformedHeaders => "malformed-headers",
            Self::MalformedJsonBody => "malformed-json-body",
        }
    }
}

/// A fragment skipped during analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_label: Option<String>,
    pub detail: String,
}

impl Diagnostic {
    pub fn for_entry(kind: DiagnosticKind, entry_index: usize, detail: impl Into<String>) -> Self {
        Self {
            kind,
            entry_index: Some(entry_index),
            step_label: None,
            detail: detail.into(),
        }
    }

    pub fn for_step(kind: DiagnosticKind, step_label: &str, detail: impl Into<String>) -> Self {
        Self {
            kind,
            entry_index: None,
            step_label: Some(step_label.to_string()),
            detail: detail.into(),
        }
    }
}

/// Whether a run saw every fragment or skipped some
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Complete,
    Degraded,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Degraded => "degraded",
        }
    }
}

/// Result of a run that did not fail fatally
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub spec: CorrelationSpec,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisReport {
    pub fn status(&self) -> AnalysisStatus {
        if self.diagnostics.is_empty() {
            AnalysisStatus::Complete
        } else {
            AnalysisStatus::Degraded
        }
    }
}
