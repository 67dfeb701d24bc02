//! Progress reporting abstraction for scrape runs
//!
//! Defines the `ScrapeReporter` trait for lifecycle event reporting and
//! three implementations: a no-op, one that forwards to `log`, and one
//! that records timestamped events for tests and embedders.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use super::crawl_types::{ScrapeError, ScrapePhase};
use super::dataset::ScrapeSummary;
use crate::records::RecordKind;

/// Trait for reporting scrape progress at key lifecycle events
///
/// The orchestrator calls these from its own task only (never from worker
/// tasks), in the order the events are aggregated.
pub trait ScrapeReporter: Send + Sync {
    /// Report a lifecycle transition
    fn report_phase(&self, phase: ScrapePhase);

    /// Report that a page was retrieved
    fn report_page_fetched(&self, url: &str, rendered: bool);

    /// Report that a URL's contribution was dropped
    fn report_page_failed(&self, url: &str, error: &ScrapeError);

    /// Report how many records of `kind` a page produced
    fn report_records(&self, url: &str, kind: RecordKind, count: usize);

    /// Report the end-of-run summary
    fn report_completed(&self, summary: &ScrapeSummary);
}

/// Reporter that does nothing
///
/// All methods are no-ops and will be inlined away by the compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl ScrapeReporter for NoOpReporter {
    #[inline(always)]
    fn report_phase(&self, _phase: ScrapePhase) {}

    #[inline(always)]
    fn report_page_fetched(&self, _url: &str, _rendered: bool) {}

    #[inline(always)]
    fn report_page_failed(&self, _url: &str, _error: &ScrapeError) {}

    #[inline(always)]
    fn report_records(&self, _url: &str, _kind: RecordKind, _count: usize) {}

    #[inline(always)]
    fn report_completed(&self, _summary: &ScrapeSummary) {}
}

/// Reporter that forwards every event to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ScrapeReporter for LogReporter {
    fn report_phase(&self, phase: ScrapePhase) {
        info!(target: "institute_scrape::progress", "phase: {phase}");
    }

    fn report_page_fetched(&self, url: &str, rendered: bool) {
        debug!(target: "institute_scrape::progress", "fetched {url} (rendered: {rendered})");
    }

    fn report_page_failed(&self, url: &str, error: &ScrapeError) {
        warn!(target: "institute_scrape::progress", "skipping {url}: {error}");
    }

    fn report_records(&self, url: &str, kind: RecordKind, count: usize) {
        debug!(
            target: "institute_scrape::progress",
            "{count} {} records from {url}",
            kind.name()
        );
    }

    fn report_completed(&self, summary: &ScrapeSummary) {
        info!(
            target: "institute_scrape::progress",
            "completed in {:.1}s: {} pages, {} records, {} failed URLs",
            summary.duration.as_secs_f64(),
            summary.pages_fetched,
            summary.total_records(),
            summary.failure_count()
        );
    }
}

/// What happened, without the timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeEventKind {
    PhaseChanged(ScrapePhase),
    PageFetched { url: String, rendered: bool },
    PageFailed { url: String, error: String },
    RecordsExtracted {
        url: String,
        kind: RecordKind,
        count: usize,
    },
    Completed {
        pages_fetched: usize,
        failed_urls: usize,
        records: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeEvent {
    pub at: DateTime<Utc>,
    pub kind: ScrapeEventKind,
}

/// Reporter that keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<ScrapeEvent>>,
}

impl CollectingReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<ScrapeEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Phases in the order they were entered.
    #[must_use]
    pub fn phases(&self) -> Vec<ScrapePhase> {
        self.events()
            .into_iter()
            .filter_map(|e| match e.kind {
                ScrapeEventKind::PhaseChanged(phase) => Some(phase),
                _ => None,
            })
            .collect()
    }

    fn push(&self, kind: ScrapeEventKind) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ScrapeEvent {
                at: Utc::now(),
                kind,
            });
    }
}

impl ScrapeReporter for CollectingReporter {
    fn report_phase(&self, phase: ScrapePhase) {
        self.push(ScrapeEventKind::PhaseChanged(phase));
    }

    fn report_page_fetched(&self, url: &str, rendered: bool) {
        self.push(ScrapeEventKind::PageFetched {
            url: url.to_string(),
            rendered,
        });
    }

    fn report_page_failed(&self, url: &str, error: &ScrapeError) {
        self.push(ScrapeEventKind::PageFailed {
            url: url.to_string(),
            error: error.to_string(),
        });
    }

    fn report_records(&self, url: &str, kind: RecordKind, count: usize) {
        self.push(ScrapeEventKind::RecordsExtracted {
            url: url.to_string(),
            kind,
            count,
        });
    }

    fn report_completed(&self, summary: &ScrapeSummary) {
        self.push(ScrapeEventKind::Completed {
            pages_fetched: summary.pages_fetched,
            failed_urls: summary.failure_count(),
            records: summary.total_records(),
        });
    }
}

impl<T: ScrapeReporter + ?Sized> ScrapeReporter for &T {
    fn report_phase(&self, phase: ScrapePhase) {
        (**self).report_phase(phase);
    }

    fn report_page_fetched(&self, url: &str, rendered: bool) {
        (**self).report_page_fetched(url, rendered);
    }

    fn report_page_failed(&self, url: &str, error: &ScrapeError) {
        (**self).report_page_failed(url, error);
    }

    fn report_records(&self, url: &str, kind: RecordKind, count: usize) {
        (**self).report_records(url, kind, count);
    }

    fn report_completed(&self, summary: &ScrapeSummary) {
        (**self).report_completed(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchError;

    #[test]
    fn collecting_reporter_keeps_order() {
        let reporter = CollectingReporter::new();
        reporter.report_phase(ScrapePhase::Init);
        reporter.report_page_fetched("https://inst.example.org/", false);
        reporter.report_page_failed(
            "https://inst.example.org/news",
            &ScrapeError::from(FetchError::HttpStatus {
                url: "https://inst.example.org/news".into(),
                status: 404,
            }),
        );
        reporter.report_phase(ScrapePhase::Done);

        let events = reporter.events();
        assert_eq!(events.len(), 4);
        assert!(events.windows(2).all(|w| w[0].at <= w[1].at));
        assert!(matches!(
            &events[2].kind,
            ScrapeEventKind::PageFailed { error, .. } if error.contains("404")
        ));
        assert_eq!(reporter.phases(), vec![ScrapePhase::Init, ScrapePhase::Done]);
    }

    #[test]
    fn references_forward() {
        let reporter = CollectingReporter::new();
        let by_ref = &reporter;
        by_ref.report_records("https://inst.example.org/people", RecordKind::Staff, 3);
        assert_eq!(reporter.events().len(), 1);
    }
}
