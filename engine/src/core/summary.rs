//! Terminal summary of analysis runs

use std::path::Path;

use super::constants::APP_NAME;
use crate::domain::correlation::{AnalysisReport, AnalysisStatus, classify, is_id_like};
use crate::utils::terminal::file_link;

// Label width: "Correlations:" is 13 chars, pad to 15 for alignment
const W: usize = 15;

/// Print the tool name and version
pub fn print_header() {
    println!();
    println!(
        "  \x1b[1m\x1b[36m{}\x1b[0m \x1b[90mv{}\x1b[0m",
        APP_NAME,
        env!("CARGO_PKG_VERSION")
    );
    println!();
}

/// Print the outcome of one analyzed capture
pub fn print_report(capture: &Path, report: &AnalysisReport, spec_path: &Path) {
    let spec = &report.spec;
    let meta = &spec.metadata;
    let summary = &spec.summary;

    let name = meta
        .capture_name
        .clone()
        .unwrap_or_else(|| capture.display().to_string());
    println!("  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}", "Capture:", name);
    println!(
        "  \x1b[90m➜  {:<W$} {} analyzed, {} excluded, {} steps\x1b[0m",
        "Transactions:", meta.analyzed_transactions, meta.excluded_transactions, meta.step_count
    );
    println!(
        "  \x1b[32m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {} \x1b[90m({} usages)\x1b[0m",
        "Correlations:", summary.total_correlations, summary.total_usages
    );
    if spec.orphan_ids.is_some() {
        println!(
            "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
            "Orphans:", summary.total_orphans
        );
    }
    if !summary.by_strategy.is_empty() {
        let strategies = summary
            .by_strategy
            .iter()
            .map(|(strategy, count)| format!("{} {}", count, strategy))
            .collect::<Vec<_>>()
            .join(", ");
        println!("  \x1b[90m➜  {:<W$} {}\x1b[0m", "Strategies:", strategies);
    }
    match report.status() {
        AnalysisStatus::Complete => {}
        AnalysisStatus::Degraded => println!(
            "  \x1b[33m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m degraded \x1b[90m({} skipped fragments)\x1b[0m",
            "Status:",
            report.diagnostics.len()
        ),
    }
    println!(
        "  \x1b[35m➜\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
        "Spec:",
        file_link(spec_path)
    );
    println!();
}

/// Print a fatal error for one capture
pub fn print_failure(capture: &Path, error: &anyhow::Error) {
    println!(
        "  \x1b[31m✗\x1b[0m  \x1b[1m{:<W$}\x1b[0m {}",
        "Capture:",
        capture.display()
    );
    println!("  \x1b[31m   {:<W$} {:#}\x1b[0m", "Error:", error);
    println!();
}

/// Print one line per value: type and ID-likeness
pub fn print_classification(value: &str, min_numeric_digits: usize) {
    let id_like = if is_id_like(value, min_numeric_digits) {
        "\x1b[32mid-like\x1b[0m"
    } else {
        "\x1b[90mnoise\x1b[0m"
    };
    println!("  {:<12} {} {}", classify(value).as_str(), id_like, value);
}
