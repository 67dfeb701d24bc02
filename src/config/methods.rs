//! Builder methods available for all states
//!
//! This module contains methods that can be called on the builder
//! regardless of its current type state.

use super::builder::ScrapeConfigBuilder;
use crate::records::{RecordKind, ScalarConflict};

impl<State> ScrapeConfigBuilder<State> {
    /// Crawl the links found on section pages.
    #[must_use]
    pub fn include_subpages(mut self, include: bool) -> Self {
        self.config.include_subpages = include;
        self
    }

    /// Subpage levels below the sections.
    ///
    /// Depth 0 scrapes the sections only; depth N follows links found at
    /// level N-1, up to level N. Only used with `include_subpages(true)`.
    #[must_use]
    pub fn depth(mut self, depth: u8) -> Self {
        self.config.depth = depth;
        self
    }

    /// Request JavaScript-rendered pages from the fetcher.
    #[must_use]
    pub fn use_selenium(mut self, render: bool) -> Self {
        self.config.use_selenium = render;
        self
    }

    #[must_use]
    pub fn save_json(mut self, save: bool) -> Self {
        self.config.save_json = save;
        self
    }

    /// Fetch each project's detail page into `project_contents`.
    #[must_use]
    pub fn extract_project_content(mut self, extract: bool) -> Self {
        self.config.extract_project_content = extract;
        self
    }

    /// Pages fetched and extracted at once (1..=64, default 5).
    #[must_use]
    pub fn max_concurrent_pages(mut self, max: usize) -> Self {
        self.config.max_concurrent_pages = max;
        self
    }

    #[must_use]
    pub fn publications_limit(mut self, limit: usize) -> Self {
        self.config.publications_limit = limit;
        self
    }

    /// Records gathered so far below which fallback strategies still run.
    #[must_use]
    pub fn min_strategy_yield(mut self, min: usize) -> Self {
        self.config.min_strategy_yield = min;
        self
    }

    #[must_use]
    pub fn scalar_conflict(mut self, policy: ScalarConflict) -> Self {
        self.config.scalar_conflict = policy;
        self
    }

    /// Replace the URL exclusion globs (`*` matches anything).
    #[must_use]
    pub fn excluded_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.excluded_patterns = patterns;
        self
    }

    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, retries: u8) -> Self {
        self.config.max_retries = retries;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    #[must_use]
    pub fn institute_name(mut self, name: impl Into<String>) -> Self {
        self.config.institute_name = name.into();
        self
    }

    /// Replace the candidate paths for one record type.
    #[must_use]
    pub fn targets(mut self, kind: RecordKind, paths: Vec<String>) -> Self {
        self.config.targets.insert(kind, paths);
        self
    }
}
