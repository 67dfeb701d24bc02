//! `reqwest`-backed fetcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, warn};
use reqwest::Client;
use url::Url;

use super::{FetchError, FetchResult, PageFetcher};
use crate::config::ScrapeConfig;
use crate::utils::{
    BROWSER_USER_AGENT, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS, MAX_HTML_SIZE,
};

const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Plain HTTP fetcher with a per-request timeout and linear-backoff retries.
///
/// It cannot execute JavaScript. A `render_js` request is served as a
/// plain fetch and reported with `rendered = false`.
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    max_retries: u8,
    retry_backoff: Duration,
    render_notice_logged: AtomicBool,
}

impl HttpFetcher {
    /// Build a fetcher with an explicit timeout, retry budget and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] when the TLS backend cannot be
    /// initialised.
    pub fn new(timeout: Duration, max_retries: u8, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self {
            client,
            timeout,
            max_retries,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            render_notice_logged: AtomicBool::new(false),
        })
    }

    /// Build a fetcher from the run configuration.
    ///
    /// # Errors
    ///
    /// See [`HttpFetcher::new`].
    pub fn from_config(config: &ScrapeConfig) -> Result<Self, FetchError> {
        Self::new(
            Duration::from_secs(config.request_timeout_secs()),
            config.max_retries(),
            config.user_agent(),
        )
    }

    /// Delay multiplied by the attempt number between retries.
    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    async fn fetch_once(&self, url: &Url) -> Result<FetchResult, FetchError> {
        let response = self.client.get(url.as_str()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout.as_secs(),
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let effective_url = response.url().to_string();
        let html = response.text().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: format!("failed to read body: {e}"),
        })?;
        if html.len() > MAX_HTML_SIZE {
            warn!(
                target: "institute_scrape::fetcher",
                "{effective_url} returned {} bytes, above the {MAX_HTML_SIZE} byte limit",
                html.len()
            );
        }
        Ok(FetchResult::new(effective_url, html))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        let timeout = Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS);
        // A default reqwest client only fails without a TLS backend, which
        // rustls always provides.
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            timeout,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            render_notice_logged: AtomicBool::new(false),
        }
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, render_js: bool) -> Result<FetchResult, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        if render_js && !self.render_notice_logged.swap(true, Ordering::Relaxed) {
            debug!(
                target: "institute_scrape::fetcher",
                "JavaScript rendering requested but HttpFetcher serves static HTML only"
            );
        }

        let mut attempt: u8 = 0;
        loop {
            match self.fetch_once(&parsed).await {
                Ok(result) => {
                    debug!(
                        target: "institute_scrape::fetcher",
                        "fetched {} ({} bytes, attempt {})",
                        result.url,
                        result.html.len(),
                        attempt + 1
                    );
                    return Ok(result);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    debug!(
                        target: "institute_scrape::fetcher",
                        "retry {attempt}/{} for {url}: {e}",
                        self.max_retries
                    );
                    tokio::time::sleep(self.retry_backoff * u32::from(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
