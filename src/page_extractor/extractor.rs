//! Generic extractor: parse, run strategies, merge, normalise.

use log::{debug, trace};
use scraper::Html;
use url::Url;

use super::document::parse_document;
use super::errors::ExtractError;
use super::merger::{merge, Partial};
use super::strategy::{Strategy, Trigger};
use crate::fetcher::FetchResult;
use crate::records::{PageContext, Record, ScalarConflict};
use crate::utils::DEFAULT_MIN_STRATEGY_YIELD;

/// Ordered strategies for one record type plus the merge policy.
pub struct Extractor<R: Record> {
    strategies: Vec<Box<dyn Strategy<R>>>,
    min_yield: usize,
    policy: ScalarConflict,
    max_records: Option<usize>,
}

impl<R: Record> std::fmt::Debug for Extractor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("kind", &R::KIND)
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("min_yield", &self.min_yield)
            .field("policy", &self.policy)
            .field("max_records", &self.max_records)
            .finish()
    }
}

impl<R: Record> Extractor<R> {
    /// Strategies are tried in the given order; index 0 has the highest
    /// priority.
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn Strategy<R>>>) -> Self {
        Self {
            strategies,
            min_yield: DEFAULT_MIN_STRATEGY_YIELD,
            policy: ScalarConflict::default(),
            max_records: None,
        }
    }

    #[must_use]
    pub fn with_min_yield(mut self, min_yield: usize) -> Self {
        self.min_yield = min_yield;
        self
    }

    #[must_use]
    pub fn with_conflict_policy(mut self, policy: ScalarConflict) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = Some(max);
        self
    }

    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    #[must_use]
    pub fn policy(&self) -> ScalarConflict {
        self.policy
    }

    /// Extract finalised records from a fetched page.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Parse`] when the HTML cannot be parsed.
    /// Strategy failures are logged and treated as zero yield.
    pub fn extract(&self, page: &FetchResult, base_url: &Url) -> Result<Vec<R>, ExtractError> {
        Ok(self
            .extract_attributed(page, base_url)?
            .into_iter()
            .map(|p| p.record)
            .collect())
    }

    /// Like [`extract`](Self::extract), keeping which strategy each record
    /// is attributed to.
    ///
    /// # Errors
    ///
    /// See [`extract`](Self::extract).
    pub fn extract_attributed(
        &self,
        page: &FetchResult,
        base_url: &Url,
    ) -> Result<Vec<Partial<R>>, ExtractError> {
        let doc = parse_document(&page.html)?;
        let page_url = Url::parse(&page.url).unwrap_or_else(|_| base_url.clone());
        let ctx = PageContext {
            base_url,
            page_url: &page_url,
        };
        Ok(self.extract_document(&doc, &ctx))
    }

    /// Run the pipeline over an already parsed document.
    ///
    /// Candidates are normalised before merging, so a value that fails
    /// validation never hides a valid one from a lower-priority strategy.
    pub fn extract_document(&self, doc: &Html, ctx: &PageContext<'_>) -> Vec<Partial<R>> {
        let normalized: Vec<Partial<R>> = self
            .run_strategies(doc, ctx)
            .into_iter()
            .filter_map(|p| {
                let Partial {
                    record,
                    priority,
                    strategy,
                } = p;
                record
                    .normalize(ctx)
                    .map(|record| Partial::new(record, priority, strategy))
            })
            .collect();

        let mut out = merge(normalized, self.policy);
        if let Some(max) = self.max_records {
            out.truncate(max);
        }
        debug!(
            target: "institute_scrape::extract",
            "{}: {} records from {}",
            R::KIND.name(),
            out.len(),
            ctx.page_url
        );
        out
    }

    fn run_strategies(&self, doc: &Html, ctx: &PageContext<'_>) -> Vec<Partial<R>> {
        let mut pool: Vec<Partial<R>> = Vec::new();
        let mut yielded = 0usize;

        for (priority, strategy) in self.strategies.iter().enumerate() {
            if strategy.trigger() == Trigger::BelowYield && yielded >= self.min_yield {
                trace!(
                    target: "institute_scrape::extract",
                    "skipping fallback strategy {} ({yielded} records already)",
                    strategy.name()
                );
                continue;
            }
            match strategy.attempt(doc, ctx) {
                Ok(records) => {
                    let found = records.len();
                    yielded += records
                        .iter()
                        .filter(|r| r.identity_key().is_some())
                        .count();
                    pool.extend(
                        records
                            .into_iter()
                            .map(|r| Partial::new(r, priority, strategy.name())),
                    );
                    trace!(
                        target: "institute_scrape::extract",
                        "strategy {} yielded {found} candidates",
                        strategy.name()
                    );
                }
                Err(e) => {
                    debug!(
                        target: "institute_scrape::extract",
                        "strategy {} skipped for {}: {e}",
                        strategy.name(),
                        ctx.page_url
                    );
                }
            }
        }
        pool
    }
}
