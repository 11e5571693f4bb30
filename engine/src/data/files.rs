//! Capture and spec files on the local filesystem

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rustc_hash::FxHashSet;
use tokio::fs;

use crate::core::constants::OUTPUT_FILE_SUFFIX;
use crate::domain::correlation::{AnalysisError, Capture, CorrelationSpec};

/// Read and parse a capture file.
///
/// The capture name defaults to the file stem when the document has none.
pub async fn load_capture(path: &Path) -> Result<Capture, AnalysisError> {
    // Read directly; ENOENT maps to NotFound without a racy exists() check
    let bytes = fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AnalysisError::CaptureNotFound {
                path: path.to_path_buf(),
            }
        } else {
            AnalysisError::CaptureUnreadable {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let document: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
        AnalysisError::CaptureMalformed(format!("{}: {}", path.display(), e))
    })?;

    let mut capture = Capture::from_json(document)?.with_source_path(path.display().to_string());
    if capture.name.is_none()
        && let Some(stem) = path.file_stem()
    {
        capture = capture.with_name(stem.to_string_lossy());
    }

    tracing::debug!(
        path = %path.display(),
        size = bytes.len(),
        steps = capture.steps.len(),
        "Capture loaded"
    );

    Ok(capture)
}

/// Serialize a spec and write it, creating parent directories
pub async fn write_spec(path: &Path, spec: &CorrelationSpec, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_vec_pretty(spec)
    } else {
        serde_json::to_vec(spec)
    }
    .context("Failed to serialize correlation spec")?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, &json)
        .await
        .with_context(|| format!("Failed to write spec: {}", path.display()))?;

    tracing::debug!(path = %path.display(), size = json.len(), "Spec written");
    Ok(())
}

/// Where the spec for `capture` goes: `<stem>.correlations.json`, next to the
/// capture or inside `output_dir`
pub fn default_output_path(capture: &Path, output_dir: Option<&Path>) -> PathBuf {
    output_path(capture, output_dir, None)
}

/// Spec paths for a batch of captures, in input order.
///
/// Captures that would share a spec path (same stem under one `output_dir`)
/// get numbered names: `run.correlations.json`, `run-2.correlations.json`.
pub fn batch_output_paths(captures: &[PathBuf], output_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut taken: FxHashSet<PathBuf> = FxHashSet::default();

    captures
        .iter()
        .map(|capture| {
            let mut path = default_output_path(capture, output_dir);
            let mut number = 2;
            while !taken.insert(path.clone()) {
                path = output_path(capture, output_dir, Some(number));
                number += 1;
            }
            if number > 2 {
                tracing::warn!(
                    capture = %capture.display(),
                    path = %path.display(),
                    "Spec name already used in this run, writing a numbered file"
                );
            }
            path
        })
        .collect()
}

fn output_path(capture: &Path, output_dir: Option<&Path>, number: Option<usize>) -> PathBuf {
    let stem = capture
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "capture".to_string());
    let file_name = match number {
        Some(n) => format!("{}-{}{}", stem, n, OUTPUT_FILE_SUFFIX),
        None => format!("{}{}", stem, OUTPUT_FILE_SUFFIX),
    };

    match output_dir {
        Some(dir) => dir.join(file_name),
        None => capture.with_file_name(file_name),
    }
}
