//! Aggregated output of a run.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::records::{
    ContactInfo, NewsItem, PageContent, Project, ProjectDetail, Publication, RecordKind,
    ResearchGroup, Section, StaffMember,
};

/// Every record extracted during a run, plus the crawled page map.
///
/// Serialised as-is into `all_data.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeDataset {
    pub sections: Vec<Section>,
    pub news: Vec<NewsItem>,
    pub research_groups: Vec<ResearchGroup>,
    pub publications: Vec<Publication>,
    pub staff: Vec<StaffMember>,
    pub contact_info: ContactInfo,
    pub projects: Vec<Project>,
    /// Subpage crawl output keyed by normalised URL.
    pub all_pages: BTreeMap<String, PageContent>,
    /// Project detail pages keyed by project URL.
    pub project_contents: BTreeMap<String, ProjectDetail>,
}

impl ScrapeDataset {
    /// Record count for `kind`. The contact block counts as one record.
    #[must_use]
    pub fn count(&self, kind: RecordKind) -> usize {
        match kind {
            RecordKind::Sections => self.sections.len(),
            RecordKind::News => self.news.len(),
            RecordKind::ResearchGroups => self.research_groups.len(),
            RecordKind::Publications => self.publications.len(),
            RecordKind::Staff => self.staff.len(),
            RecordKind::ContactInfo => 1,
            RecordKind::Projects => self.projects.len(),
        }
    }

    /// Counts for every kind, keyed by output name order.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<RecordKind, usize> {
        std::iter::once(RecordKind::Sections)
            .chain(RecordKind::PAGE_KINDS)
            .map(|kind| (kind, self.count(kind)))
            .collect()
    }
}

/// A URL whose contribution was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUrl {
    pub url: String,
    pub error: String,
}

/// Run statistics reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeSummary {
    pub started_at: DateTime<Utc>,
    pub pages_fetched: usize,
    pub failed_urls: Vec<FailedUrl>,
    pub records: BTreeMap<RecordKind, usize>,
    pub duration: Duration,
}

impl ScrapeSummary {
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failed_urls.len()
    }

    #[must_use]
    pub fn total_records(&self) -> usize {
        self.records.values().sum()
    }
}

/// Dataset and summary returned by [`ScrapeOrchestrator::run`](super::ScrapeOrchestrator::run).
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub dataset: ScrapeDataset,
    pub summary: ScrapeSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_cover_every_kind() {
        let dataset = ScrapeDataset {
            news: vec![NewsItem {
                title: "Open day".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let counts = dataset.counts();
        assert_eq!(counts.len(), 7);
        assert_eq!(counts[&RecordKind::News], 1);
        assert_eq!(counts[&RecordKind::ContactInfo], 1);
        assert_eq!(counts[&RecordKind::Staff], 0);
    }

    #[test]
    fn all_data_field_order() {
        let json = serde_json::to_string(&ScrapeDataset::default()).unwrap();
        let sections = json.find("\"sections\"").unwrap();
        let news = json.find("\"news\"").unwrap();
        let pages = json.find("\"all_pages\"").unwrap();
        assert!(sections < news && news < pages);
    }
}
