//! Getter methods for `ScrapeConfig`
//!
//! This module provides the accessor methods for retrieving configuration
//! values from a `ScrapeConfig` instance, plus JSON loading.

use std::path::PathBuf;

use url::Url;

use super::builder::{parse_base_url, validate};
use super::types::{ConfigError, ScrapeConfig};
use crate::records::{RecordKind, ScalarConflict};

impl ScrapeConfig {
    /// Load a configuration serialised with serde and validate it like
    /// [`ScrapeConfigBuilder::build`](super::builder::ScrapeConfigBuilder::build).
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed JSON, otherwise the same errors
    /// as the builder.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.base_url = parse_base_url(config.base_url.as_str())?;
        validate(&mut config)?;
        Ok(config)
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    #[must_use]
    pub fn include_subpages(&self) -> bool {
        self.include_subpages
    }

    #[must_use]
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Whether pages should be requested JavaScript-rendered.
    #[must_use]
    pub fn render_js(&self) -> bool {
        self.use_selenium
    }

    #[must_use]
    pub fn save_json(&self) -> bool {
        self.save_json
    }

    #[must_use]
    pub fn extract_project_content(&self) -> bool {
        self.extract_project_content
    }

    #[must_use]
    pub fn max_concurrent_pages(&self) -> usize {
        self.max_concurrent_pages
    }

    #[must_use]
    pub fn publications_limit(&self) -> usize {
        self.publications_limit
    }

    #[must_use]
    pub fn min_strategy_yield(&self) -> usize {
        self.min_strategy_yield
    }

    #[must_use]
    pub fn scalar_conflict(&self) -> ScalarConflict {
        self.scalar_conflict
    }

    #[must_use]
    pub fn excluded_patterns(&self) -> &[String] {
        &self.excluded_patterns
    }

    /// Whether `url` matches one of the exclusion globs.
    #[must_use]
    pub fn is_excluded(&self, url: &str) -> bool {
        self.excluded_patterns_compiled
            .iter()
            .any(|re| re.is_match(url))
    }

    #[must_use]
    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
    }

    #[must_use]
    pub fn max_retries(&self) -> u8 {
        self.max_retries
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn institute_name(&self) -> &str {
        &self.institute_name
    }

    /// Candidate paths for `kind`, as configured.
    #[must_use]
    pub fn targets(&self, kind: RecordKind) -> &[String] {
        self.targets.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Candidate pages for `kind` resolved against the base URL, without
    /// duplicates.
    #[must_use]
    pub fn target_urls(&self, kind: RecordKind) -> Vec<Url> {
        let mut urls: Vec<Url> = Vec::new();
        for path in self.targets(kind) {
            if let Ok(url) = self.base_url.join(path.trim_start_matches('/'))
                && !urls.contains(&url)
            {
                urls.push(url);
            }
        }
        urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_urls_resolve_against_base() {
        let config = ScrapeConfig::builder()
            .base_url("https://inst.example.org/")
            .output_dir("out")
            .targets(RecordKind::Staff, vec!["people".into(), "/people".into(), "team".into()])
            .build()
            .unwrap();
        let urls: Vec<_> = config
            .target_urls(RecordKind::Staff)
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            urls,
            vec!["https://inst.example.org/people", "https://inst.example.org/team"]
        );
    }

    #[test]
    fn contact_targets_include_home_page() {
        let config = ScrapeConfig::default();
        assert!(
            config
                .target_urls(RecordKind::ContactInfo)
                .contains(config.base_url())
        );
    }

    #[test]
    fn json_round_trip_recompiles_exclusions() {
        let config = ScrapeConfig::builder()
            .base_url("https://inst.example.org/")
            .output_dir("out")
            .excluded_patterns(vec!["*/private/*".into()])
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let loaded = ScrapeConfig::from_json(&json).unwrap();
        assert!(loaded.is_excluded("https://inst.example.org/private/x"));
        assert!(!loaded.is_excluded("https://inst.example.org/public/x"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            ScrapeConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }
}
