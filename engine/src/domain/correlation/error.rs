//! Fatal analysis errors
//!
//! Only problems that prevent any analysis surface here. Malformed fragments
//! inside an otherwise readable capture are reported as
//! [`Diagnostic`](super::types::Diagnostic)s instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Capture file does not exist
    #[error("Capture not found: {}", path.display())]
    CaptureNotFound { path: PathBuf },

    /// Capture file exists but could not be read
    #[error("Failed to read capture {}: {source}", path.display())]
    CaptureUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Capture is not a JSON object of steps
    #[error("Malformed capture: {0}")]
    CaptureMalformed(String),
}
