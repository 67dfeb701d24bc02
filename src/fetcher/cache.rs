//! Per-run page cache keyed by normalised URL and rendering mode.
//!
//! Each key owns a `tokio::sync::OnceCell`; the first caller runs the fetch
//! and every concurrent caller for the same key awaits that one result.
//! Failures are cached too, so a broken URL is not retried within a run.
//! A rendered and a static fetch of one URL are separate entries when the
//! fetcher can render.

use std::sync::Arc;

use dashmap::DashMap;
use log::debug;
use tokio::sync::OnceCell;

use super::{FetchError, FetchResult, PageFetcher};
use crate::utils::normalize_url_key;

type Slot = Arc<OnceCell<Result<Arc<FetchResult>, FetchError>>>;

#[derive(Debug, Default)]
pub struct PageCache {
    entries: DashMap<(String, bool), Slot>,
}

impl PageCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached result for `url`, fetching it through `fetcher`
    /// on first access.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] when `url` cannot be normalised,
    /// or the (possibly cached) error from the fetcher.
    pub async fn get_or_fetch<F: PageFetcher>(
        &self,
        fetcher: &F,
        url: &str,
        render_js: bool,
    ) -> Result<Arc<FetchResult>, FetchError> {
        let key = normalize_url_key(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let render_js = render_js && fetcher.renders_js();
        // Clone the slot out so no map guard is held across the await.
        let slot: Slot = self
            .entries
            .entry((key.clone(), render_js))
            .or_default()
            .clone();

        slot.get_or_init(|| async {
            debug!(target: "institute_scrape::cache", "cache miss: {key} (render_js={render_js})");
            fetcher.fetch(&key, render_js).await.map(Arc::new)
        })
        .await
        .clone()
    }

    /// Number of distinct URL and rendering-mode pairs requested so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
