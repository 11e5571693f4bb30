// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Correlate";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".correlate";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "correlate.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "CORRELATE_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "CORRELATE_LOG";

// =============================================================================
// Environment Variables - Analysis
// =============================================================================

/// Environment variable for the minimum digit count of numeric ids
pub const ENV_MIN_ID_DIGITS: &str = "CORRELATE_MIN_ID_DIGITS";

/// Environment variable to disable orphan detection
pub const ENV_NO_ORPHANS: &str = "CORRELATE_NO_ORPHANS";

// =============================================================================
// Environment Variables - Output
// =============================================================================

/// Environment variable for the output directory
pub const ENV_OUTPUT_DIR: &str = "CORRELATE_OUTPUT_DIR";

// =============================================================================
// Analysis Defaults
// =============================================================================

/// Numeric strings shorter than this are flags, not ids
pub const DEFAULT_MIN_NUMERIC_ID_DIGITS: usize = 2;

/// Maximum nesting depth walked in JSON bodies
pub const DEFAULT_MAX_JSON_DEPTH: usize = 10;

/// Maximum length of usage example fragments (in characters)
pub const DEFAULT_EXAMPLE_MAX_LENGTH: usize = crate::utils::string::PREVIEW_MAX_LENGTH;

/// Telemetry, analytics, advertising and CDN hosts (matched by suffix)
pub const DEFAULT_EXCLUDED_DOMAINS: &[&str] = &[
    "google-analytics.com",
    "analytics.google.com",
    "googletagmanager.com",
    "doubleclick.net",
    "googlesyndication.com",
    "googleadservices.com",
    "facebook.net",
    "connect.facebook.net",
    "hotjar.com",
    "hotjar.io",
    "segment.io",
    "segment.com",
    "mixpanel.com",
    "amplitude.com",
    "newrelic.com",
    "nr-data.net",
    "sentry.io",
    "datadoghq.com",
    "browser-intake-datadoghq.com",
    "clarity.ms",
    "bing.com",
    "optimizely.com",
    "fullstory.com",
    "cloudflareinsights.com",
    "fonts.googleapis.com",
    "fonts.gstatic.com",
    "cdnjs.cloudflare.com",
    "cdn.jsdelivr.net",
    "unpkg.com",
];

/// Path extensions of static assets
pub const DEFAULT_STATIC_EXTENSIONS: &[&str] = &[
    "js", "mjs", "css", "map", "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "bmp",
    "woff", "woff2", "ttf", "otf", "eot", "mp4", "webm", "mp3",
];

/// Response header name suffixes that mark an identifier
pub const DEFAULT_ID_HEADER_SUFFIXES: &[&str] = &[
    "id",
    "_id",
    "-id",
    "uuid",
    "correlationid",
    "requestid",
    "traceid",
    "spanid",
];

/// Structural response headers never treated as sources
pub const DEFAULT_RESPONSE_HEADER_DENYLIST: &[&str] = &[
    "content-type",
    "content-length",
    "content-encoding",
    "content-language",
    "content-disposition",
    "cache-control",
    "date",
    "expires",
    "last-modified",
    "etag",
    "vary",
    "server",
    "connection",
    "keep-alive",
    "transfer-encoding",
    "set-cookie",
    "location",
    "strict-transport-security",
    "x-content-type-options",
    "x-frame-options",
    "x-xss-protection",
    "x-amz-cf-pop",
    "cf-ray",
];

/// Transport request headers never searched for usages.
/// Entries ending in `*` match by prefix.
pub const DEFAULT_REQUEST_HEADER_DENYLIST: &[&str] = &[
    "host",
    "content-length",
    "content-type",
    "connection",
    "accept*",
    "user-agent",
    "cookie",
    "origin",
    "referer",
    "cache-control",
    "pragma",
    "upgrade-insecure-requests",
    "sec-*",
    "priority",
];

/// Query parameter names used by OAuth/OIDC flows
pub const DEFAULT_OAUTH_PARAMS: &[&str] = &[
    "code",
    "state",
    "nonce",
    "session_state",
    "id_token",
    "access_token",
    "refresh_token",
    "code_challenge",
    "code_verifier",
    "client_id",
    "redirect_uri",
];

// =============================================================================
// Output
// =============================================================================

/// Suffix of generated spec files (`capture.json` -> `capture.correlations.json`)
pub const OUTPUT_FILE_SUFFIX: &str = ".correlations.json";
