//! Shared configuration constants for institute_scrape
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Site the scraper was built against.
pub const DEFAULT_BASE_URL: &str = "http://www.imse-cnm.csic.es/";

/// Institute name used to seed `ContactInfo` before extraction.
pub const DEFAULT_INSTITUTE_NAME: &str = "Institute of Microelectronics of Seville (IMSE-CNM)";

/// Country used to seed `ContactInfo` before extraction.
pub const DEFAULT_COUNTRY: &str = "Spain";

/// Default number of pages fetched and extracted concurrently.
///
/// Small on purpose: the target is a single institutional server.
pub const DEFAULT_MAX_CONCURRENT_PAGES: usize = 5;

/// Upper bound accepted by the config builder for `max_concurrent_pages`.
pub const MAX_CONCURRENT_PAGES_LIMIT: usize = 64;

/// Default subpage crawl depth (sections plus one level of links).
pub const DEFAULT_SUBPAGE_DEPTH: u8 = 1;

/// Maximum number of publication records returned per extractor run.
pub const DEFAULT_PUBLICATIONS_LIMIT: usize = 50;

/// Minimum accumulated yield below which fallback strategies run.
pub const DEFAULT_MIN_STRATEGY_YIELD: usize = 1;

/// Per-request network timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Retry attempts after the first failed request.
pub const DEFAULT_MAX_RETRIES: u8 = 2;

/// Text fields longer than this many characters are truncated.
pub const MAX_TEXT_CHARS: usize = 10_000;

/// Pause after a rendered page's load event before its DOM is captured.
pub const RENDER_SETTLE_MILLIS: u64 = 2_000;

/// Maximum HTML input size accepted by the extractors (10 MB).
///
/// Larger documents are reported as a `ParseError` instead of being handed
/// to html5ever.
pub const MAX_HTML_SIZE: usize = 10 * 1024 * 1024;

/// Browser-like user agent sent by `HttpFetcher`.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
