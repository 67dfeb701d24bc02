pub mod config;
pub mod content_saver;
pub mod crawl_engine;
pub mod fetcher;
pub mod navigator;
pub mod normalizer;
pub mod page_extractor;
pub mod records;
pub mod utils;

pub use config::{ConfigError, ScrapeConfig};
pub use content_saver::save_dataset;
pub use crawl_engine::{
    CollectingReporter, LogReporter, NoOpReporter, ScrapeDataset, ScrapeError, ScrapeOrchestrator,
    ScrapeOutcome, ScrapePhase, ScrapeReporter, ScrapeResult, ScrapeSummary,
};
#[cfg(feature = "browser")]
pub use fetcher::BrowserFetcher;
pub use fetcher::{FetchError, FetchResult, HttpFetcher, PageCache, PageFetcher};
pub use navigator::SiteNavigator;
pub use page_extractor::{ExtractError, Extractor, ExtractorSet, Strategy, Trigger};
pub use records::{
    ContactInfo, ContentSection, FundingInfo, NewsItem, PageContent, PageImage, PeriodInfo,
    Project, ProjectDetail, Publication, Record, RecordKind, ResearchGroup, ScalarConflict,
    Section, StaffMember, Subpage,
};

/// Scrape the configured site, logging progress through `log`.
///
/// With the `browser` feature and `use_selenium` set, pages that need
/// JavaScript are rendered in headless Chromium. When no browser can be
/// launched the run falls back to plain HTTP.
///
/// # Errors
///
/// Returns [`ScrapeError::Configuration`] when the HTTP client cannot be
/// built or the base URL is unreachable. Per-page failures are listed in
/// the returned summary instead.
pub async fn scrape(config: ScrapeConfig) -> ScrapeResult<ScrapeOutcome> {
    #[cfg(feature = "browser")]
    {
        if config.render_js() {
            match fetcher::BrowserFetcher::launch(&config).await {
                Ok(fetcher) => {
                    let orchestrator =
                        ScrapeOrchestrator::new(config, fetcher).with_reporter(LogReporter);
                    let outcome = orchestrator.run().await;
                    if let Some(fetcher) = orchestrator.into_fetcher() {
                        fetcher.shutdown().await;
                    }
                    return outcome;
                }
                Err(e) => log::warn!(
                    target: "institute_scrape::fetcher",
                    "{e}; continuing with static HTML only"
                ),
            }
        }
    }
    ScrapeOrchestrator::from_config(config)?
        .with_reporter(LogReporter)
        .run()
        .await
}
