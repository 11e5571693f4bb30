//! Capture document
//!
//! A capture is the recorder's output: step label → ordered list of raw
//! transaction records. Two shapes are accepted:
//!
//! ```text
//! { "01 - login": [ {...}, {...} ], "02 - search": [ ... ] }
//!
//! { "name": "checkout", "steps": { "01 - login": [ ... ] } }
//! ```
//!
//! Step order follows document order (`serde_json` is built with
//! `preserve_order`). Records are kept as raw JSON here; validation happens
//! in the normalizer so a single bad record never rejects the whole capture.

use serde_json::Value as JsonValue;

use super::error::AnalysisError;
use crate::utils::json::type_name;

/// One recorded user action and its raw transaction records
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureStep {
    pub label: String,
    pub records: JsonValue,
}

/// Caller-owned capture document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Capture {
    pub name: Option<String>,
    pub source_path: Option<String>,
    pub steps: Vec<CaptureStep>,
}

impl Capture {
    /// Build a capture from a parsed JSON document.
    ///
    /// Fails only when the document is not a JSON object; everything below
    /// the step level is validated later and reported as diagnostics.
    pub fn from_json(document: JsonValue) -> Result<Self, AnalysisError> {
        let mut root = match document {
            JsonValue::Object(root) => root,
            other => {
                return Err(AnalysisError::CaptureMalformed(format!(
                    "expected a JSON object of steps, got {}",
                    type_name(&other)
                )));
            }
        };

        let (name, steps) = match root.get_mut("steps") {
            Some(JsonValue::Object(steps)) => {
                let steps = std::mem::take(steps);
                let name = root
                    .get("name")
                    .or_else(|| root.get("capture_name"))
                    .and_then(JsonValue::as_str)
                    .map(String::from);
                (name, steps)
            }
            _ => (None, root),
        };

        let steps = steps
            .into_iter()
            .map(|(label, records)| CaptureStep { label, records })
            .collect();

        Ok(Self {
            name,
            source_path: None,
            steps,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_source_path(mut self, path: impl Into<String>) -> Self {
        self.source_path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_capture_keeps_step_order() {
        let capture = Capture::from_json(json!({
            "02 - search": [],
            "01 - login": [],
        }))
        .unwrap();

        let labels: Vec<_> = capture.steps.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["02 - search", "01 - login"]);
        assert!(capture.name.is_none());
    }

    #[test]
    fn test_envelope_capture() {
        let capture = Capture::from_json(json!({
            "name": "checkout",
            "steps": { "01 - login": [{ "url": "https://shop.test/" }] }
        }))
        .unwrap();

        assert_eq!(capture.name.as_deref(), Some("checkout"));
        assert_eq!(capture.steps.len(), 1);
        assert_eq!(capture.steps[0].label, "01 - login");
    }

    #[test]
    fn test_non_object_capture_is_fatal() {
        let err = Capture::from_json(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, AnalysisError::CaptureMalformed(_)));
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_step_named_steps_in_bare_capture() {
        // "steps" holding a list is an ordinary step, not an envelope
        let capture = Capture::from_json(json!({ "steps": [] })).unwrap();
        assert_eq!(capture.steps.len(), 1);
        assert_eq!(capture.steps[0].label, "steps");
    }
}
