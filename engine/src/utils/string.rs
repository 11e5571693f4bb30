//! String utility functions

/// Default maximum length for preview text (in characters)
pub const PREVIEW_MAX_LENGTH: usize = 120;

/// Truncate text to max length with ellipsis
pub fn truncate_preview(text: &str, max_len: usize) -> String {
    let text = text.trim();
    if text.chars().count() > max_len {
        format!("{}...", text.chars().take(max_len).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Convert an identifier-ish name to `snake_case`.
///
/// camelCase boundaries become underscores, every run of
/// non-alphanumerics collapses to one underscore, and the result is
/// lowercase ASCII. A leading digit gets a `v_` prefix so the result is a
/// valid variable name in common script languages.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase()
                && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
            {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
        prev = Some(c);
    }

    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("v_{}", trimmed)
    } else {
        trimmed.to_string()
    }
}
