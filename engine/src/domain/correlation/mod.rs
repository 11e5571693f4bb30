//! Correlation inference over recorded HTTP sessions
//!
//! Pipeline stages, leaves first:
//! - `filter` - Domain Filter (telemetry, analytics and CDN noise)
//! - `classify` - Value Classifier (type tag and ID-likeness)
//! - `normalize` - Entry Normalizer (global `entry_index` ordering)
//! - `sources` - Source Extractor (response headers, redirects, JSON bodies)
//! - `usages` - Usage Matcher (forward search through requests)
//! - `orphans` - Orphan Detector (ID-shaped request values with no source)
//! - `strategy` - Parameterization Classifier (replay strategy, names, extractors)
//! - `pipeline` - [`CorrelationEngine`], which runs all of the above

pub mod capture;
pub mod classify;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod orphans;
pub mod pipeline;
pub mod sources;
pub mod strategy;
pub mod types;
pub mod usages;

pub use capture::{Capture, CaptureStep};
pub use classify::{ValueType, classify, classify_json, is_id_key, is_id_like};
pub use error::AnalysisError;
pub use filter::DomainFilter;
pub use pipeline::{CorrelationEngine, ENGINE_VERSION};
pub use types::{
    AnalysisReport, AnalysisStatus, Candidate, CandidateType, Confidence, Correlation,
    CorrelationSpec, CorrelationSummary, Diagnostic, DiagnosticKind, LocationType, OrphanId,
    Parameterization, SourceLocation, Strategy, Transaction, Usage,
};
