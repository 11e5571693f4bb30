//! Domain Filter
//!
//! Decides whether a transaction is in scope for analysis. Telemetry,
//! analytics and CDN hosts are excluded by domain suffix; static assets are
//! optionally excluded by path extension.
//!
//! URLs that do not parse are kept in scope: there is no host to judge them
//! by, and their headers and bodies can still carry correlations.

use url::Url;

use crate::core::config::AnalysisConfig;
use crate::utils::url::host_of;

#[derive(Debug, Clone)]
pub struct DomainFilter {
    excluded_domains: Vec<String>,
    static_extensions: Vec<String>,
}

impl DomainFilter {
    pub fn new(config: &AnalysisConfig) -> Self {
        let excluded_domains = config
            .excluded_domains
            .iter()
            .map(|d| d.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        let static_extensions = if config.skip_static_assets {
            config
                .static_extensions
                .iter()
                .map(|e| format!(".{}", e.trim().trim_start_matches('.').to_ascii_lowercase()))
                .filter(|e| e.len() > 1)
                .collect()
        } else {
            Vec::new()
        };

        Self {
            excluded_domains,
            static_extensions,
        }
    }

    /// Whether a host equals, or is a subdomain of, an excluded domain
    pub fn is_excluded_host(&self, host: &str) -> bool {
        self.excluded_domains.iter().any(|domain| {
            host == domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    fn is_static_asset(&self, url: &Url) -> bool {
        let path = url.path().to_ascii_lowercase();
        self.static_extensions.iter().any(|ext| path.ends_with(ext))
    }

    /// Whether a transaction URL should be left out of the analysis
    pub fn is_excluded(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        if let Some(host) = host_of(&parsed)
            && self.is_excluded_host(&host)
        {
            return true;
        }
        self.is_static_asset(&parsed)
    }
}
