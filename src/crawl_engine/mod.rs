//! Crawl Engine Module
//!
//! This module contains the scrape orchestrator and the types it produces:
//! the aggregated dataset, the run-level error taxonomy and the progress
//! reporting seam.

// Sub-modules
pub mod crawl_types;
pub mod dataset;
pub mod orchestrator;
pub mod progress;

// Re-exports for public API
pub use crawl_types::{ScrapeError, ScrapePhase, ScrapeResult};
pub use dataset::{FailedUrl, ScrapeDataset, ScrapeOutcome, ScrapeSummary};
pub use orchestrator::ScrapeOrchestrator;
pub use progress::{
    CollectingReporter, LogReporter, NoOpReporter, ScrapeEvent, ScrapeEventKind, ScrapeReporter,
};
