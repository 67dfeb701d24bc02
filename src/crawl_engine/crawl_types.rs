//! Core types for a scrape run.
//!
//! This module contains the run-level error type and the lifecycle phases
//! the orchestrator moves through.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::fetcher::FetchError;
use crate::page_extractor::ExtractError;

/// Lifecycle of one run:
/// `Init → DiscoverSections → ExtractPerSection → [SubpageCrawl] → Aggregate → Done | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapePhase {
    Init,
    DiscoverSections,
    ExtractPerSection,
    SubpageCrawl,
    Aggregate,
    Done,
    Failed,
}

impl ScrapePhase {
    /// Whether the run has stopped.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for ScrapePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::DiscoverSections => "discover sections",
            Self::ExtractPerSection => "extract per section",
            Self::SubpageCrawl => "subpage crawl",
            Self::Aggregate => "aggregate",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Error type for scrape operations.
///
/// Only [`ScrapeError::Configuration`] aborts a run; every other variant is
/// caught at the task boundary and recorded against the URL concerned.
#[derive(Debug, Clone, Error)]
pub enum ScrapeError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("extraction failed for {url}: {source}")]
    Extract {
        url: String,
        #[source]
        source: ExtractError,
    },

    #[error("task for {url} failed: {message}")]
    Task { url: String, message: String },
}

impl ScrapeError {
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// URL the failure refers to, when there is one.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Configuration(ConfigError::Unreachable { url, .. }) => Some(url),
            Self::Configuration(_) => None,
            Self::Fetch(e) => e.url(),
            Self::Extract { url, .. } | Self::Task { url, .. } => Some(url),
        }
    }
}

/// Convenience alias for Result with `ScrapeError`
pub type ScrapeResult<T> = Result<T, ScrapeError>;
