//! One extractor per record type, configured from the run configuration.

use log::debug;
use scraper::Html;
use url::Url;

use super::document::parse_document;
use super::errors::ExtractError;
use super::extractor::Extractor;
use super::merger::Partial;
use super::{contact, news, projects, publications, research, staff};
use crate::config::ScrapeConfig;
use crate::fetcher::FetchResult;
use crate::records::{
    ContactInfo, NewsItem, PageContext, Project, Publication, RecordKind, ResearchGroup,
    ScalarConflict, StaffMember,
};
use crate::utils::{DEFAULT_MIN_STRATEGY_YIELD, DEFAULT_PUBLICATIONS_LIMIT};

/// Attributed records extracted from one page, per record type.
#[derive(Debug, Clone, Default)]
pub struct PageRecords {
    pub news: Vec<Partial<NewsItem>>,
    pub research_groups: Vec<Partial<ResearchGroup>>,
    pub publications: Vec<Partial<Publication>>,
    pub staff: Vec<Partial<StaffMember>>,
    pub contact: Vec<Partial<ContactInfo>>,
    pub projects: Vec<Partial<Project>>,
}

impl PageRecords {
    /// Record count for `kind`.
    #[must_use]
    pub fn count(&self, kind: RecordKind) -> usize {
        match kind {
            RecordKind::Sections => 0,
            RecordKind::News => self.news.len(),
            RecordKind::ResearchGroups => self.research_groups.len(),
            RecordKind::Publications => self.publications.len(),
            RecordKind::Staff => self.staff.len(),
            RecordKind::ContactInfo => self.contact.len(),
            RecordKind::Projects => self.projects.len(),
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        RecordKind::PAGE_KINDS.iter().map(|k| self.count(*k)).sum()
    }
}

/// One extractor per page record kind. Sections are discovered by
/// [`SiteNavigator`](crate::SiteNavigator), which owns its own extractor.
#[derive(Debug)]
pub struct ExtractorSet {
    pub news: Extractor<NewsItem>,
    pub research_groups: Extractor<ResearchGroup>,
    pub publications: Extractor<Publication>,
    pub staff: Extractor<StaffMember>,
    pub contact: Extractor<ContactInfo>,
    pub projects: Extractor<Project>,
}

impl Default for ExtractorSet {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIN_STRATEGY_YIELD,
            ScalarConflict::default(),
            DEFAULT_PUBLICATIONS_LIMIT,
        )
    }
}

impl ExtractorSet {
    /// Stock strategies with the given yield threshold, conflict policy
    /// and publication cap.
    #[must_use]
    pub fn new(min_yield: usize, policy: ScalarConflict, publications_limit: usize) -> Self {
        Self {
            news: news::extractor()
                .with_min_yield(min_yield)
                .with_conflict_policy(policy),
            research_groups: research::extractor()
                .with_min_yield(min_yield)
                .with_conflict_policy(policy),
            publications: publications::extractor()
                .with_min_yield(min_yield)
                .with_conflict_policy(policy)
                .with_max_records(publications_limit),
            staff: staff::extractor()
                .with_min_yield(min_yield)
                .with_conflict_policy(policy),
            contact: contact::extractor()
                .with_min_yield(min_yield)
                .with_conflict_policy(policy),
            projects: projects::extractor()
                .with_min_yield(min_yield)
                .with_conflict_policy(policy),
        }
    }

    #[must_use]
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::new(
            config.min_strategy_yield(),
            config.scalar_conflict(),
            config.publications_limit(),
        )
    }

    /// Parse `page` once and run the extractors for `kinds`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Parse`] when the page is not HTML.
    pub fn extract_page(
        &self,
        page: &FetchResult,
        base_url: &Url,
        kinds: &[RecordKind],
    ) -> Result<PageRecords, ExtractError> {
        let doc = parse_document(&page.html)?;
        let page_url = Url::parse(&page.url).unwrap_or_else(|_| base_url.clone());
        let ctx = PageContext {
            base_url,
            page_url: &page_url,
        };
        let records = self.extract_kinds(&doc, &ctx, kinds);
        debug!(
            target: "institute_scrape::extract",
            "{}: {} records for {:?}",
            page.url,
            records.total(),
            kinds
        );
        Ok(records)
    }

    fn extract_kinds(&self, doc: &Html, ctx: &PageContext<'_>, kinds: &[RecordKind]) -> PageRecords {
        let mut records = PageRecords::default();
        for kind in kinds {
            match kind {
                RecordKind::Sections => {}
                RecordKind::News => records.news = self.news.extract_document(doc, ctx),
                RecordKind::ResearchGroups => {
                    records.research_groups = self.research_groups.extract_document(doc, ctx);
                }
                RecordKind::Publications => {
                    records.publications = self.publications.extract_document(doc, ctx);
                }
                RecordKind::Staff => records.staff = self.staff.extract_document(doc, ctx),
                RecordKind::ContactInfo => {
                    records.contact = self.contact.extract_document(doc, ctx);
                }
                RecordKind::Projects => {
                    records.projects = self.projects.extract_document(doc, ctx);
                }
            }
        }
        records
    }
}
