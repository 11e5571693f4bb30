//! URL utility functions

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use url::Url;

/// Percent-decode a string, replacing invalid UTF-8 sequences.
///
/// Borrows the input when nothing needed decoding.
pub fn percent_decode(s: &str) -> Cow<'_, str> {
    if !s.contains('%') {
        return Cow::Borrowed(s);
    }
    percent_decode_str(s).decode_utf8_lossy()
}

/// Resolve a redirect target against the URL of the request that produced it.
///
/// Absolute targets parse on their own; relative ones (`/next?x=1`) need a
/// parseable base.
pub fn resolve_location(request_url: &str, location: &str) -> Result<Url, url::ParseError> {
    match Url::parse(location) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(request_url)?.join(location),
        Err(e) => Err(e),
    }
}

/// Lower-cased host of a URL, if it has one
pub fn host_of(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.trim_end_matches('.').to_ascii_lowercase())
}
