//! Headless Chromium fetcher for pages that build their content with
//! JavaScript.
//!
//! Every page is first fetched over HTTP, which gives the status check and
//! retry policy of [`HttpFetcher`]. A `render_js` request then loads the
//! page in Chromium and captures the DOM after a short settle delay. When
//! rendering fails the static HTML is returned with `rendered = false`.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::error::CdpError;
use futures::StreamExt;
use log::{debug, error, info, trace, warn};
use tokio::task::JoinHandle;

use super::{FetchError, FetchResult, HttpFetcher, PageFetcher};
use crate::config::ScrapeConfig;
use crate::utils::RENDER_SETTLE_MILLIS;

/// Environment variable naming the Chrome/Chromium binary to launch.
pub const CHROMIUM_PATH_ENV: &str = "CHROMIUM_PATH";

/// Fetcher backed by one shared headless browser.
pub struct BrowserFetcher {
    http: HttpFetcher,
    browser: Browser,
    handler: JoinHandle<()>,
    timeout: Duration,
    settle: Duration,
}

impl std::fmt::Debug for BrowserFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserFetcher")
            .field("http", &self.http)
            .field("timeout", &self.timeout)
            .field("settle", &self.settle)
            .finish_non_exhaustive()
    }
}

/// Browser binary from `CHROMIUM_PATH`, when it points at a file.
/// Otherwise chromiumoxide searches the usual install locations.
fn browser_executable() -> Option<PathBuf> {
    let path = PathBuf::from(std::env::var_os(CHROMIUM_PATH_ENV)?);
    if path.exists() {
        Some(path)
    } else {
        warn!(
            target: "institute_scrape::fetcher",
            "{CHROMIUM_PATH_ENV} points to a missing file: {}",
            path.display()
        );
        None
    }
}

impl BrowserFetcher {
    /// Launch headless Chromium with the config's timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Browser`] when no browser can be launched and
    /// [`FetchError::Client`] when the HTTP client cannot be built.
    pub async fn launch(config: &ScrapeConfig) -> Result<Self, FetchError> {
        let http = HttpFetcher::from_config(config)?;
        let timeout = Duration::from_secs(config.request_timeout_secs());

        let mut builder = BrowserConfig::builder()
            .request_timeout(timeout)
            .window_size(1920, 1080)
            .headless_mode(HeadlessMode::default())
            .arg("--no-sandbox")
            .arg(format!("--user-agent={}", config.user_agent()))
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--disable-notifications")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--mute-audio");
        if let Some(path) = browser_executable() {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(FetchError::Browser)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    let message = e.to_string();
                    // chromiumoxide does not know every CDP message Chrome sends.
                    if message.contains("data did not match any variant of untagged enum Message")
                        || message.contains("Failed to deserialize WS response")
                    {
                        trace!(target: "institute_scrape::fetcher", "ignored CDP message: {message}");
                    } else {
                        error!(target: "institute_scrape::fetcher", "browser handler error: {e}");
                    }
                }
            }
            debug!(target: "institute_scrape::fetcher", "browser handler finished");
        });
        info!(target: "institute_scrape::fetcher", "Headless browser started");

        Ok(Self {
            http,
            browser,
            handler,
            timeout,
            settle: Duration::from_millis(RENDER_SETTLE_MILLIS),
        })
    }

    /// Time given to scripts after the load event before the DOM is read.
    #[must_use]
    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Close the browser and wait for its process to exit.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(target: "institute_scrape::fetcher", "Failed to close browser: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            warn!(target: "institute_scrape::fetcher", "Failed to wait for browser exit: {e}");
        }
        self.handler.abort();
    }

    async fn render(&self, url: &str) -> Result<FetchResult, FetchError> {
        let render_err = |e: CdpError| FetchError::Render {
            url: url.to_string(),
            message: e.to_string(),
        };
        let page = self.browser.new_page(url).await.map_err(render_err)?;
        let captured = self.capture(&page, url).await.map_err(render_err);
        if let Err(e) = page.close().await {
            debug!(target: "institute_scrape::fetcher", "closing tab for {url} failed: {e}");
        }
        captured
    }

    async fn capture(&self, page: &Page, url: &str) -> Result<FetchResult, CdpError> {
        page.wait_for_navigation().await?;
        tokio::time::sleep(self.settle).await;
        let html = page.content().await?;
        let effective_url = page
            .url()
            .await?
            .unwrap_or_else(|| url.to_string());
        Ok(FetchResult::new(effective_url, html).rendered(true))
    }
}

impl Drop for BrowserFetcher {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str, render_js: bool) -> Result<FetchResult, FetchError> {
        let plain = self.http.fetch(url, false).await?;
        if !render_js {
            return Ok(plain);
        }

        let budget = self.timeout + self.settle;
        let rendered = match tokio::time::timeout(budget, self.render(&plain.url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: plain.url.clone(),
                secs: budget.as_secs(),
            }),
        };
        match rendered {
            Ok(page) => {
                debug!(
                    target: "institute_scrape::fetcher",
                    "rendered {} ({} bytes)",
                    page.url,
                    page.html.len()
                );
                Ok(page)
            }
            Err(e) => {
                warn!(
                    target: "institute_scrape::fetcher",
                    "{e}; using the static HTML instead"
                );
                Ok(plain)
            }
        }
    }

    fn renders_js(&self) -> bool {
        true
    }
}
