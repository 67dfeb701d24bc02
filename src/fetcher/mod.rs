//! Page fetching.
//!
//! The extraction core never performs I/O itself: it is handed a
//! [`FetchResult`] produced by some [`PageFetcher`]. [`HttpFetcher`] is the
//! stock implementation and `BrowserFetcher` (feature `browser`) adds
//! JavaScript rendering. [`PageCache`] sits in front of any fetcher and
//! guarantees at most one fetch per normalised URL and rendering mode.

#[cfg(feature = "browser")]
pub mod browser;
pub mod cache;
pub mod http;

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;
pub use cache::PageCache;
pub use http::HttpFetcher;

use std::future::Future;

use thiserror::Error;

/// Raw page content plus how it was retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// Effective URL after redirects.
    pub url: String,
    pub html: String,
    /// Whether JavaScript was executed before the HTML was captured.
    pub rendered: bool,
}

impl FetchResult {
    #[must_use]
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            rendered: false,
        }
    }

    #[must_use]
    pub fn rendered(mut self, rendered: bool) -> Self {
        self.rendered = rendered;
        self
    }
}

/// Failure to retrieve a page. Always recoverable for the URL concerned.
///
/// `Clone` so a cached failure can be handed to every waiter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("timed out after {secs}s fetching {url}")]
    Timeout { url: String, secs: u64 },

    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("rendering failed for {url}: {message}")]
    Render { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("failed to launch browser: {0}")]
    Browser(String),
}

impl FetchError {
    /// URL the failure refers to, when there is one.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Network { url, .. }
            | Self::Timeout { url, .. }
            | Self::HttpStatus { url, .. }
            | Self::InvalidUrl { url, .. }
            | Self::Render { url, .. } => Some(url),
            Self::Client(_) | Self::Browser(_) => None,
        }
    }

    /// Whether another attempt could plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidUrl { .. }
            | Self::Render { .. }
            | Self::Client(_)
            | Self::Browser(_) => false,
        }
    }
}

/// Anything that can turn a URL into HTML.
///
/// Implementations enforce their own timeout and retry policy and report
/// every failure as a [`FetchError`].
pub trait PageFetcher: Send + Sync + 'static {
    /// Fetch `url`, executing JavaScript first when `render_js` is set and
    /// the implementation supports it.
    fn fetch(
        &self,
        url: &str,
        render_js: bool,
    ) -> impl Future<Output = Result<FetchResult, FetchError>> + Send;

    /// Whether `render_js` changes what [`fetch`](Self::fetch) returns.
    /// Fetchers that ignore it share one cache entry for both modes.
    fn renders_js(&self) -> bool {
        false
    }
}
