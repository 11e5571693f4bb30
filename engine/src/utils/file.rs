//! File utility functions

use std::path::PathBuf;

/// Expand a user-supplied path to an absolute path.
///
/// `~` and `~/...` resolve against the home directory; relative paths
/// (including bare names) resolve against the current directory. The path is
/// not canonicalized, so `..` components are kept as written.
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    let expanded = match path {
        "" => PathBuf::from("."),
        "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        _ => match (path.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(path),
        },
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path_unchanged() {
        assert_eq!(expand_path("/captures/checkout.json"), PathBuf::from("/captures/checkout.json"));
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(expand_path("  /captures/out  "), PathBuf::from("/captures/out"));
    }

    #[test]
    fn test_relative_paths_become_absolute() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(expand_path("captures/a.json"), cwd.join("captures/a.json"));
        assert_eq!(expand_path("../shared"), cwd.join("../shared"));
        assert!(expand_path("").is_absolute());
    }

    #[test]
    fn test_tilde_expansion() {
        let result = expand_path("~/.correlate/correlate.json");
        assert!(result.is_absolute());
        assert!(!result.to_string_lossy().contains('~'));
        assert!(result.ends_with(".correlate/correlate.json"));

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~"), home);
        }
    }
}
