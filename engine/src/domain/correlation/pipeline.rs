//! Correlation Engine
//!
//! Runs the full analysis over one capture:
//!
//! ```text
//! Capture ─► normalize ─► extract ─► dedup ─► match usages ─► Correlations
//!                 │                    │
//!                 │                    └─► candidate value set ─► detect orphans
//!                 └─► diagnostics (skipped fragments)
//! ```
//!
//! The engine is synchronous and owns nothing between runs, so one instance
//! can analyze many captures from many threads.

use rustc_hash::FxHashSet;
use serde_json::Value as JsonValue;
use url::Url;

use super::capture::Capture;
use super::error::AnalysisError;
use super::filter::DomainFilter;
use super::normalize::normalize_capture;
use super::orphans::detect_orphans;
use super::sources::{dedup_candidates, extract_candidates};
use super::strategy::{VariableNames, confidence_for, for_correlation};
use super::types::{
    AnalysisReport, CaptureMetadata, Correlation, CorrelationSpec, CorrelationSummary,
    Diagnostic, DiagnosticKind, OrphanId, Transaction,
};
use super::usages::UsageMatcher;
use crate::core::config::AnalysisConfig;

/// Version stamped into every generated spec
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    config: AnalysisConfig,
    filter: DomainFilter,
}

impl CorrelationEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        let filter = DomainFilter::new(&config);
        Self { config, filter }
    }

    /// Parse a capture document and analyze it
    pub fn analyze_json(&self, document: JsonValue) -> Result<AnalysisReport, AnalysisError> {
        let capture = Capture::from_json(document)?;
        Ok(self.analyze(&capture))
    }

    /// Analyze a parsed capture. Never fails: malformed fragments become
    /// diagnostics on the report.
    pub fn analyze(&self, capture: &Capture) -> AnalysisReport {
        let mut diagnostics = Vec::new();

        let transactions = normalize_capture(capture, &mut diagnostics);
        self.report_malformed_urls(&transactions, &mut diagnostics);

        let excluded = transactions
            .iter()
            .filter(|tx| self.filter.is_excluded(&tx.url))
            .count();

        let candidates = extract_candidates(&transactions, &self.filter, &self.config, &mut diagnostics);
        let extracted = candidates.len();
        let candidates = dedup_candidates(candidates);
        tracing::debug!(extracted, unique = candidates.len(), "Source extraction complete");

        let matcher = UsageMatcher::new(&transactions, &self.filter, &self.config);
        let mut names = VariableNames::new();
        let mut correlations = Vec::new();

        for candidate in &candidates {
            let usages = matcher.find_usages(&candidate.value, candidate.entry_index + 1);
            if usages.is_empty() {
                continue;
            }
            let parameterization = for_correlation(candidate, usages.len(), &mut names);
            correlations.push(Correlation {
                correlation_id: format!("corr_{:03}", correlations.len() + 1),
                correlation_type: candidate.candidate_type,
                value_type: candidate.value_type,
                confidence: confidence_for(candidate),
                source: candidate.clone(),
                usages,
                parameterization,
            });
        }

        let orphan_ids = self.config.include_orphans.then(|| {
            let known: FxHashSet<&str> = candidates.iter().map(|c| c.value.as_str()).collect();
            detect_orphans(&matcher, &self.config, &known, &mut names)
        });

        let summary = summarize(&correlations, orphan_ids.as_deref());
        let metadata = CaptureMetadata {
            capture_name: capture.name.clone(),
            source_path: capture.source_path.clone(),
            generated_at: chrono::Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            step_count: capture.steps.len(),
            total_transactions: transactions.len(),
            analyzed_transactions: transactions.len() - excluded,
            excluded_transactions: excluded,
            skipped_fragments: diagnostics.len(),
        };

        tracing::info!(
            transactions = transactions.len(),
            excluded,
            candidates = candidates.len(),
            correlations = summary.total_correlations,
            orphans = summary.total_orphans,
            skipped = diagnostics.len(),
            "Analysis complete"
        );

        AnalysisReport {
            spec: CorrelationSpec {
                metadata,
                correlations,
                summary,
                orphan_ids,
            },
            diagnostics,
        }
    }

    /// Request URLs that do not parse are still analyzed for headers and
    /// bodies, but their URL parts are invisible to matching.
    fn report_malformed_urls(&self, transactions: &[Transaction], diagnostics: &mut Vec<Diagnostic>) {
        for tx in transactions {
            if let Err(e) = Url::parse(&tx.url) {
                tracing::debug!(entry_index = tx.entry_index, url = %tx.url, error = %e, "Unparseable request URL");
                diagnostics.push(Diagnostic::for_entry(
                    DiagnosticKind::MalformedUrl,
                    tx.entry_index,
                    format!("request URL {:?}: {}", tx.url, e),
                ));
            }
        }
    }
}

impl Default for CorrelationEngine {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

fn summarize(correlations: &[Correlation], orphans: Option<&[OrphanId]>) -> CorrelationSummary {
    let mut summary = CorrelationSummary {
        total_correlations: correlations.len(),
        total_usages: correlations.iter().map(|c| c.usages.len()).sum(),
        total_orphans: orphans.map_or(0, <[OrphanId]>::len),
        ..Default::default()
    };

    for c in correlations {
        *summary.by_type.entry(c.correlation_type).or_default() += 1;
        *summary.by_confidence.entry(c.confidence).or_default() += 1;
        *summary.by_strategy.entry(c.parameterization.strategy).or_default() += 1;
    }
    for o in orphans.unwrap_or_default() {
        *summary.by_type.entry(o.candidate_type).or_default() += 1;
        *summary.by_confidence.entry(o.confidence).or_default() += 1;
        *summary.by_strategy.entry(o.parameterization.strategy).or_default() += 1;
    }

    summary
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
