//! Type-safe builder for `ScrapeConfig` using the typestate pattern
//!
//! This module provides a fluent builder interface with compile-time validation
//! ensuring that the base URL and output directory are set before building a
//! `ScrapeConfig`. Value checks happen in `build()`.

use std::marker::PhantomData;
use std::path::PathBuf;

use regex::Regex;
use url::Url;

use super::types::{ConfigError, ScrapeConfig};
use crate::utils::MAX_CONCURRENT_PAGES_LIMIT;

/// Compile a glob pattern into a regex
///
/// `*` matches any sequence; every other character is literal. The pattern
/// is anchored to match the full URL. This is done once at config creation
/// time to avoid repeated compilation in hot paths.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPattern`] if the resulting regex is invalid.
pub(crate) fn compile_glob_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    let regex_pattern = regex::escape(pattern).replace(r"\*", ".*");
    let anchored = format!("^{regex_pattern}$");
    Regex::new(&anchored).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

// Type states for the builder
pub struct WithBaseUrl;
pub struct Complete;

pub struct ScrapeConfigBuilder<State = ()> {
    pub(crate) base_url: Option<String>,
    pub(crate) config: ScrapeConfig,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for ScrapeConfigBuilder<()> {
    fn default() -> Self {
        Self {
            base_url: None,
            config: ScrapeConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfig {
    /// Create a builder for configuring a `ScrapeConfig` with a fluent interface
    ///
    /// ```rust
    /// # use institute_scrape::config::ScrapeConfig;
    /// # fn main() -> Result<(), institute_scrape::config::ConfigError> {
    /// let config = ScrapeConfig::builder()
    ///     .base_url("https://www.example.org/")
    ///     .output_dir("./data")
    ///     .include_subpages(true)
    ///     .depth(2)
    ///     .build()?;
    /// assert_eq!(config.depth(), 2);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn builder() -> ScrapeConfigBuilder<()> {
        ScrapeConfigBuilder::default()
    }
}

impl ScrapeConfigBuilder<()> {
    pub fn base_url(self, url: impl Into<String>) -> ScrapeConfigBuilder<WithBaseUrl> {
        let url_string = url.into().trim().to_string();

        // Normalize URL: add http:// if no scheme is present. Any explicit
        // scheme is kept and checked in build().
        let normalized_url = if url_string.contains("://") {
            url_string
        } else {
            format!("http://{url_string}")
        };

        ScrapeConfigBuilder {
            base_url: Some(normalized_url),
            config: self.config,
            _phantom: PhantomData,
        }
    }
}

impl ScrapeConfigBuilder<WithBaseUrl> {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> ScrapeConfigBuilder<Complete> {
        self.config.output_dir = dir.into();
        ScrapeConfigBuilder {
            base_url: self.base_url,
            config: self.config,
            _phantom: PhantomData,
        }
    }
}

/// Parse and check a base URL: http(s) with a host.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    // Candidate paths are joined onto the base, so it must end in '/'.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_fragment(None);
    Ok(url)
}

/// Check ranges and compile the exclusion patterns.
pub(crate) fn validate(config: &mut ScrapeConfig) -> Result<(), ConfigError> {
    if !(1..=MAX_CONCURRENT_PAGES_LIMIT).contains(&config.max_concurrent_pages) {
        return Err(ConfigError::InvalidValue {
            field: "max_concurrent_pages",
            reason: format!(
                "{} is outside 1..={MAX_CONCURRENT_PAGES_LIMIT}",
                config.max_concurrent_pages
            ),
        });
    }
    if config.publications_limit == 0 {
        return Err(ConfigError::InvalidValue {
            field: "publications_limit",
            reason: "must be at least 1".to_string(),
        });
    }
    if config.request_timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            field: "request_timeout_secs",
            reason: "must be at least 1".to_string(),
        });
    }
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "user_agent",
            reason: "must not be empty".to_string(),
        });
    }
    config.excluded_patterns_compiled = config
        .excluded_patterns
        .iter()
        .map(|p| compile_glob_pattern(p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(())
}

// Build method only available when all required fields are set
impl ScrapeConfigBuilder<Complete> {
    /// Validate and produce the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an unusable base URL, an out-of-range
    /// value or an exclusion pattern that does not compile.
    pub fn build(self) -> Result<ScrapeConfig, ConfigError> {
        let raw = self.base_url.ok_or_else(|| ConfigError::InvalidBaseUrl {
            url: String::new(),
            reason: "base_url is required".to_string(),
        })?;
        let mut config = self.config;
        config.base_url = parse_base_url(&raw)?;
        validate(&mut config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_is_anchored_and_literal() {
        let re = compile_glob_pattern("*/print?id=*").unwrap();
        assert!(re.is_match("https://x.org/print?id=3"));
        assert!(!re.is_match("https://x.org/printXid=3"));
    }

    #[test]
    fn base_url_gains_scheme_and_trailing_slash() {
        let config = ScrapeConfig::builder()
            .base_url("www.example.org/institute")
            .output_dir("out")
            .build()
            .unwrap();
        assert_eq!(config.base_url().as_str(), "http://www.example.org/institute/");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = ScrapeConfig::builder()
            .base_url("https://example.org/")
            .output_dir("out")
            .max_concurrent_pages(0)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "max_concurrent_pages",
                ..
            }
        ));

        let err = ScrapeConfig::builder()
            .base_url("ftp://example.org/")
            .output_dir("out")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
    }
}
