//! Terminal utility functions

use std::path::Path;

use url::Url;

/// Hyperlink a local file, showing its path.
///
/// Uses OSC 8 escape sequences for terminals that support hyperlinks.
/// Falls back to plain colored text on unsupported terminals.
pub fn file_link(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let text = path.display().to_string();
    match Url::from_file_path(&absolute) {
        Ok(url) => link_with_text(url.as_str(), &text),
        Err(()) => format!("\x1b[36m{}\x1b[0m", text),
    }
}

fn link_with_text(url: &str, text: &str) -> String {
    if supports_hyperlinks::on(supports_hyperlinks::Stream::Stdout) {
        // OSC 8 hyperlink: \x1b]8;;URL\x07TEXT\x1b]8;;\x07
        format!("\x1b]8;;{}\x07\x1b[36m{}\x1b[0m\x1b]8;;\x07", url, text)
    } else {
        format!("\x1b[36m{}\x1b[0m", text)
    }
}
