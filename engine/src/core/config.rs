use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_EXAMPLE_MAX_LENGTH, DEFAULT_EXCLUDED_DOMAINS,
    DEFAULT_ID_HEADER_SUFFIXES, DEFAULT_MAX_JSON_DEPTH, DEFAULT_MIN_NUMERIC_ID_DIGITS,
    DEFAULT_OAUTH_PARAMS, DEFAULT_REQUEST_HEADER_DENYLIST, DEFAULT_RESPONSE_HEADER_DENYLIST,
    DEFAULT_STATIC_EXTENSIONS,
};

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Analysis Configuration
// =============================================================================

/// Tuning knobs of the correlation engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Hosts excluded from analysis, matched as a domain suffix
    pub excluded_domains: Vec<String>,
    pub skip_static_assets: bool,
    /// Path extensions treated as static assets (without the dot)
    pub static_extensions: Vec<String>,
    /// Lowercase response header name suffixes marking an identifier
    pub id_header_suffixes: Vec<String>,
    pub response_header_denylist: Vec<String>,
    /// Request headers never searched; a trailing `*` matches by prefix
    pub request_header_denylist: Vec<String>,
    pub oauth_params: Vec<String>,
    pub min_numeric_id_digits: usize,
    pub max_json_depth: usize,
    pub include_orphans: bool,
    pub example_max_length: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            excluded_domains: to_strings(DEFAULT_EXCLUDED_DOMAINS),
            skip_static_assets: true,
            static_extensions: to_strings(DEFAULT_STATIC_EXTENSIONS),
            id_header_suffixes: to_strings(DEFAULT_ID_HEADER_SUFFIXES),
            response_header_denylist: to_strings(DEFAULT_RESPONSE_HEADER_DENYLIST),
            request_header_denylist: to_strings(DEFAULT_REQUEST_HEADER_DENYLIST),
            oauth_params: to_strings(DEFAULT_OAUTH_PARAMS),
            min_numeric_id_digits: DEFAULT_MIN_NUMERIC_ID_DIGITS,
            max_json_depth: DEFAULT_MAX_JSON_DEPTH,
            include_orphans: true,
            example_max_length: DEFAULT_EXAMPLE_MAX_LENGTH,
        }
    }
}

impl AnalysisConfig {
    /// Whether a query parameter name belongs to an OAuth/OIDC flow
    pub fn is_oauth_param(&self, name: &str) -> bool {
        self.oauth_params.iter().any(|p| p.eq_ignore_ascii_case(name))
    }

    /// Whether a request header is transport plumbing
    pub fn is_request_header_denied(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.request_header_denylist.iter().any(|entry| {
            let entry = entry.to_ascii_lowercase();
            match entry.strip_suffix('*') {
                Some(prefix) => name.starts_with(prefix),
                None => name == entry,
            }
        })
    }

    fn validate(&self) -> Result<()> {
        if self.min_numeric_id_digits == 0 {
            anyhow::bail!(
                "Configuration error: analysis.min_numeric_id_digits must be greater than 0"
            );
        }
        if self.max_json_depth == 0 {
            anyhow::bail!("Configuration error: analysis.max_json_depth must be greater than 0");
        }
        if self.id_header_suffixes.iter().all(|s| s.trim().is_empty()) {
            anyhow::bail!("Configuration error: analysis.id_header_suffixes must not be empty");
        }
        Ok(())
    }
}

// =============================================================================
// Output Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Pretty-print the generated JSON
    pub pretty: bool,
    /// Write specs here instead of next to each capture
    pub directory: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            directory: None,
        }
    }
}

// =============================================================================
// File Configuration
// =============================================================================

#[derive(Debug, Default, Clone, Deserialize)]
pub struct AnalysisFileConfig {
    pub excluded_domains: Option<Vec<String>>,
    pub skip_static_assets: Option<bool>,
    pub static_extensions: Option<Vec<String>>,
    pub id_header_suffixes: Option<Vec<String>>,
    pub response_header_denylist: Option<Vec<String>>,
    pub request_header_denylist: Option<Vec<String>>,
    pub oauth_params: Option<Vec<String>>,
    pub min_numeric_id_digits: Option<usize>,
    pub max_json_depth: Option<usize>,
    pub include_orphans: Option<bool>,
    pub example_max_length: Option<usize>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct OutputFileConfig {
    pub pretty: Option<bool>,
    pub directory: Option<String>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub analysis: Option<AnalysisFileConfig>,
    pub output: Option<OutputFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Overwrite `current` with every field `other` sets
macro_rules! merge_fields {
    ($current:expr, $other:expr, $section:literal, [$($field:ident),+ $(,)?]) => {
        $(
            if $other.$field.is_some() {
                tracing::trace!(
                    field = concat!($section, ".", stringify!($field)),
                    value = ?$other.$field,
                    "Merging config field"
                );
                $current.$field = $other.$field;
            }
        )+
    };
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(analysis) = other.analysis {
            let current = self.analysis.get_or_insert_with(AnalysisFileConfig::default);
            merge_fields!(
                current,
                analysis,
                "analysis",
                [
                    excluded_domains,
                    skip_static_assets,
                    static_extensions,
                    id_header_suffixes,
                    response_header_denylist,
                    request_header_denylist,
                    oauth_params,
                    min_numeric_id_digits,
                    max_json_depth,
                    include_orphans,
                    example_max_length,
                ]
            );
        }

        if let Some(output) = other.output {
            let current = self.output.get_or_insert_with(OutputFileConfig::default);
            merge_fields!(current, output, "output", [pretty, directory]);
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.correlate/correlate.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        Self::load_layers(get_profile_config_path(), cli)
    }

    fn load_layers(profile_path: Option<PathBuf>, cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Profile dir - skip if not exists
        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        // 3. Layer: defaults -> file config -> CLI/env overrides
        let file_analysis = file_config.analysis.unwrap_or_default();
        let file_output = file_config.output.unwrap_or_default();
        let defaults = AnalysisConfig::default();

        let mut excluded_domains = file_analysis
            .excluded_domains
            .unwrap_or(defaults.excluded_domains);
        for domain in &cli.exclude_domains {
            if !excluded_domains.iter().any(|d| d.eq_ignore_ascii_case(domain)) {
                excluded_domains.push(domain.clone());
            }
        }

        let analysis = AnalysisConfig {
            excluded_domains,
            skip_static_assets: file_analysis
                .skip_static_assets
                .unwrap_or(defaults.skip_static_assets),
            static_extensions: file_analysis
                .static_extensions
                .unwrap_or(defaults.static_extensions),
            id_header_suffixes: file_analysis
                .id_header_suffixes
                .map(|suffixes| suffixes.into_iter().map(|s| s.to_ascii_lowercase()).collect())
                .unwrap_or(defaults.id_header_suffixes),
            response_header_denylist: file_analysis
                .response_header_denylist
                .map(|names| names.into_iter().map(|s| s.to_ascii_lowercase()).collect())
                .unwrap_or(defaults.response_header_denylist),
            request_header_denylist: file_analysis
                .request_header_denylist
                .unwrap_or(defaults.request_header_denylist),
            oauth_params: file_analysis.oauth_params.unwrap_or(defaults.oauth_params),
            min_numeric_id_digits: cli
                .min_id_digits
                .or(file_analysis.min_numeric_id_digits)
                .unwrap_or(defaults.min_numeric_id_digits),
            max_json_depth: file_analysis
                .max_json_depth
                .unwrap_or(defaults.max_json_depth),
            include_orphans: !cli.no_orphans
                && file_analysis
                    .include_orphans
                    .unwrap_or(defaults.include_orphans),
            example_max_length: file_analysis
                .example_max_length
                .unwrap_or(defaults.example_max_length),
        };

        let output = OutputConfig {
            pretty: !cli.compact && file_output.pretty.unwrap_or(true),
            directory: cli
                .output_dir
                .clone()
                .or_else(|| file_output.directory.map(|d| expand_path(&d))),
        };

        let config = Self { analysis, output };
        config.validate()?;

        tracing::debug!(
            excluded_domains = config.analysis.excluded_domains.len(),
            min_numeric_id_digits = config.analysis.min_numeric_id_digits,
            include_orphans = config.analysis.include_orphans,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        if let Some(dir) = &self.output.directory
            && dir.is_file()
        {
            anyhow::bail!(
                "Configuration error: output.directory is a file: {}",
                dir.display()
            );
        }
        Ok(())
    }
}

/// Get the profile config path (~/.correlate/correlate.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
