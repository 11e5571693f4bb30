//! JSON utility functions

use serde_json::Value as JsonValue;

/// Human-readable name of a JSON value's type (for diagnostics)
pub fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// String form of a scalar: strings as-is, numbers and booleans in their
/// JSON spelling. Returns `None` for null and containers.
pub fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

/// Flatten any value to text: scalars via [`scalar_to_string`], arrays of
/// scalars joined with `", "`, everything else serialized.
pub fn value_to_text(value: &JsonValue) -> String {
    if let Some(s) = scalar_to_string(value) {
        return s;
    }
    match value {
        JsonValue::Null => String::new(),
        JsonValue::Array(items) if items.iter().all(|v| scalar_to_string(v).is_some()) => items
            .iter()
            .filter_map(scalar_to_string)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

// ============================================================================
// PATHS
// ============================================================================

fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Append an object key to a dot/bracket path (`order.id`, `meta["x-y"]`)
pub fn push_key(path: &str, key: &str) -> String {
    if is_plain_key(key) {
        if path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", path, key)
        }
    } else {
        format!("{}[\"{}\"]", path, key.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

/// Append an array index to a path (`items[0]`)
pub fn push_index(path: &str, index: usize) -> String {
    format!("{}[{}]", path, index)
}

/// Convert a dot/bracket path to a JSONPath expression
pub fn to_json_path(path: &str) -> String {
    if path.is_empty() || path.starts_with('[') {
        format!("${}", path)
    } else {
        format!("$.{}", path)
    }
}

// ============================================================================
// LEAF WALKING
// ============================================================================

/// A non-container value inside a JSON document
#[derive(Debug, Clone, PartialEq)]
pub struct JsonLeaf<'a> {
    /// Nearest enclosing object key (array elements inherit their array's key)
    pub key: Option<&'a str>,
    pub path: String,
    pub value: &'a JsonValue,
}

/// Collect every leaf reachable within `max_depth` container levels.
///
/// The root container is depth 0; containers nested deeper than `max_depth`
/// are not expanded.
pub fn collect_leaves(value: &JsonValue, max_depth: usize) -> Vec<JsonLeaf<'_>> {
    let mut leaves = Vec::new();
    walk(value, None, String::new(), 0, max_depth, &mut leaves);
    leaves
}

fn walk<'a>(
    value: &'a JsonValue,
    key: Option<&'a str>,
    path: String,
    depth: usize,
    max_depth: usize,
    out: &mut Vec<JsonLeaf<'a>>,
) {
    match value {
        JsonValue::Object(map) => {
            if depth > max_depth {
                return;
            }
            for (k, v) in map {
                walk(v, Some(k.as_str()), push_key(&path, k), depth + 1, max_depth, out);
            }
        }
        JsonValue::Array(items) => {
            if depth > max_depth {
                return;
            }
            for (i, v) in items.iter().enumerate() {
                walk(v, key, push_index(&path, i), depth + 1, max_depth, out);
            }
        }
        _ => out.push(JsonLeaf { key, path, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_to_string() {
        assert_eq!(scalar_to_string(&json!("abc")), Some("abc".to_string()));
        assert_eq!(scalar_to_string(&json!(987654)), Some("987654".to_string()));
        assert_eq!(scalar_to_string(&json!(true)), Some("true".to_string()));
        assert_eq!(scalar_to_string(&json!(null)), None);
        assert_eq!(scalar_to_string(&json!({"a": 1})), None);
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!(["a", "b"])), "a, b");
        assert_eq!(value_to_text(&json!(null)), "");
        assert_eq!(value_to_text(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_paths() {
        assert_eq!(push_key("", "order"), "order");
        assert_eq!(push_key("order", "id"), "order.id");
        assert_eq!(push_key("meta", "x-trace"), r#"meta["x-trace"]"#);
        assert_eq!(push_index("items", 2), "items[2]");
        assert_eq!(to_json_path("order.id"), "$.order.id");
        assert_eq!(to_json_path("[0].id"), "$[0].id");
    }

    #[test]
    fn test_collect_leaves_paths_and_keys() {
        let doc = json!({"order": {"id": "987654", "lines": [{"sku": 7}, 8]}});
        let leaves = collect_leaves(&doc, 10);
        let summary: Vec<_> = leaves
            .iter()
            .map(|l| (l.key, l.path.as_str()))
            .collect();

        assert_eq!(
            summary,
            vec![
                (Some("id"), "order.id"),
                (Some("sku"), "order.lines[0].sku"),
                (Some("lines"), "order.lines[1]"),
            ]
        );
    }

    #[test]
    fn test_collect_leaves_depth_cap() {
        let doc = json!({"a": {"b": {"c": {"id": "deep"}}}, "id": "top"});
        let leaves = collect_leaves(&doc, 1);
        let paths: Vec<_> = leaves.iter().map(|l| l.path.as_str()).collect();
        assert_eq!(paths, vec!["id"]);
    }

    #[test]
    fn test_collect_leaves_root_array() {
        let doc = json!([{"id": 1}]);
        let leaves = collect_leaves(&doc, 10);
        assert_eq!(leaves[0].path, "[0].id");
    }
}
