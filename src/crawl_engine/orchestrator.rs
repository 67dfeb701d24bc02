//! Scrape orchestration
//!
//! Drives one run through its phases. Every page is handled by its own
//! spawned task under a shared semaphore; results are joined per level and
//! merged on the orchestrator's task, so workers never touch shared record
//! state. The page cache is the only structure the workers share.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Instant;

use chrono::Utc;
use dashmap::DashSet;
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, error, info, warn};
use regex::Regex;
use tokio::sync::Semaphore;
use url::Url;

use super::crawl_types::{ScrapeError, ScrapePhase, ScrapeResult};
use super::dataset::{FailedUrl, ScrapeDataset, ScrapeOutcome, ScrapeSummary};
use super::progress::{NoOpReporter, ScrapeReporter};
use crate::config::{ConfigError, ScrapeConfig};
use crate::fetcher::{FetchResult, HttpFetcher, PageCache, PageFetcher};
use crate::navigator::SiteNavigator;
use crate::normalizer::identity_text;
use crate::page_extractor::{ExtractorSet, PageRecords, Partial, extract_project_detail, merge};
use crate::records::{
    ContactInfo, PageContent, Project, ProjectDetail, Record, RecordKind, ResearchGroup,
    ScalarConflict, Section, StaffMember, merge_list,
};
use crate::utils::{DEFAULT_COUNTRY, normalize_url_key};

/// Words in a staff member's department or position that name a group.
const GROUP_WORDS: &[&str] = &[
    "group",
    "grupo",
    "department",
    "departamento",
    "area",
    "área",
    "team",
    "equipo",
];

/// Group name following a group word in a position, e.g. `Researcher, Group: Analog Design`.
static POSITION_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:group|grupo|department|departamento|area|área|team|equipo)\b[:\s]+([^,;]+)")
        .expect("BUG: hardcoded position group regex is invalid")
});

/// Smallest staff-derived group worth reporting.
const MIN_DERIVED_GROUP_MEMBERS: usize = 2;

/// One page to extract and the record kinds routed to it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Route {
    url: Url,
    kinds: Vec<RecordKind>,
}

/// Fetch bookkeeping for one run.
#[derive(Debug, Default)]
struct RunLog {
    fetched: HashSet<String>,
    failed_keys: HashSet<String>,
    failed: Vec<FailedUrl>,
}

/// Shared handles moved into each spawned task.
struct TaskContext<F> {
    fetcher: Arc<F>,
    cache: Arc<PageCache>,
    extractors: Arc<ExtractorSet>,
    navigator: Arc<SiteNavigator>,
    base_url: Url,
}

impl<F: PageFetcher> TaskContext<F> {
    /// Fetch one routed page and run the extractors for its kinds.
    async fn extract(
        self,
        route: Route,
        render_js: bool,
    ) -> ScrapeResult<(Arc<FetchResult>, PageRecords)> {
        let page = self
            .cache
            .get_or_fetch(self.fetcher.as_ref(), route.url.as_str(), render_js)
            .await?;
        let records = self
            .extractors
            .extract_page(&page, &self.base_url, &route.kinds)
            .map_err(|source| ScrapeError::Extract {
                url: page.url.clone(),
                source,
            })?;
        Ok((page, records))
    }

    /// First candidate that fetches, in order. Misses are expected and
    /// only logged.
    async fn first_reachable(
        self,
        kind: RecordKind,
        candidates: Vec<Url>,
        render_js: bool,
    ) -> ScrapeResult<Option<(Url, Arc<FetchResult>)>> {
        for url in candidates {
            match self
                .cache
                .get_or_fetch(self.fetcher.as_ref(), url.as_str(), render_js)
                .await
            {
                Ok(page) => return Ok(Some((url, page))),
                Err(e) => debug!(
                    target: "institute_scrape::orchestrator",
                    "{} candidate {url} unavailable: {e}",
                    kind.name()
                ),
            }
        }
        Ok(None)
    }

    /// Fetch one page and read its title, text and (optionally) links.
    async fn page_content(
        self,
        url: String,
        render_js: bool,
        with_links: bool,
    ) -> ScrapeResult<(Arc<FetchResult>, PageContent)> {
        let page = self
            .cache
            .get_or_fetch(self.fetcher.as_ref(), &url, render_js)
            .await?;
        let content = self
            .navigator
            .page_content(&page, &self.base_url, with_links)
            .map_err(|source| ScrapeError::Extract {
                url: page.url.clone(),
                source,
            })?;
        Ok((page, content))
    }

    /// Fetch one project page and read its detail blocks.
    async fn project_detail(
        self,
        url: String,
        title: String,
        render_js: bool,
    ) -> ScrapeResult<(Arc<FetchResult>, ProjectDetail)> {
        let page = self
            .cache
            .get_or_fetch(self.fetcher.as_ref(), &url, render_js)
            .await?;
        let detail = extract_project_detail(&page, &title).map_err(|source| ScrapeError::Extract {
            url: page.url.clone(),
            source,
        })?;
        Ok((page, detail))
    }
}

/// Sequences navigation, per-page extraction, the optional subpage crawl
/// and aggregation for one site.
pub struct ScrapeOrchestrator<F: PageFetcher, R: ScrapeReporter = NoOpReporter> {
    config: Arc<ScrapeConfig>,
    fetcher: Arc<F>,
    cache: Arc<PageCache>,
    extractors: Arc<ExtractorSet>,
    navigator: Arc<SiteNavigator>,
    reporter: R,
}

impl ScrapeOrchestrator<HttpFetcher> {
    /// Orchestrator fetching over HTTP with the config's timeout, retry
    /// budget and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Configuration`] when the HTTP client cannot
    /// be built from the configuration.
    pub fn from_config(config: ScrapeConfig) -> ScrapeResult<Self> {
        let fetcher = HttpFetcher::from_config(&config).map_err(|e| ConfigError::InvalidValue {
            field: "http_client",
            reason: e.to_string(),
        })?;
        Ok(Self::new(config, fetcher))
    }
}

impl<F: PageFetcher> ScrapeOrchestrator<F> {
    #[must_use]
    pub fn new(config: ScrapeConfig, fetcher: F) -> Self {
        Self {
            extractors: Arc::new(ExtractorSet::from_config(&config)),
            navigator: Arc::new(SiteNavigator::from_config(&config)),
            config: Arc::new(config),
            fetcher: Arc::new(fetcher),
            cache: Arc::new(PageCache::new()),
            reporter: NoOpReporter,
        }
    }
}

impl<F: PageFetcher, R: ScrapeReporter> ScrapeOrchestrator<F, R> {
    /// Replace the event sink.
    #[must_use]
    pub fn with_reporter<R2: ScrapeReporter>(self, reporter: R2) -> ScrapeOrchestrator<F, R2> {
        ScrapeOrchestrator {
            config: self.config,
            fetcher: self.fetcher,
            cache: self.cache,
            extractors: self.extractors,
            navigator: self.navigator,
            reporter,
        }
    }

    /// Replace the extractors (site-specific strategies or selectors).
    #[must_use]
    pub fn with_extractors(mut self, extractors: ExtractorSet) -> Self {
        self.extractors = Arc::new(extractors);
        self
    }

    #[must_use]
    pub fn with_navigator(mut self, navigator: SiteNavigator) -> Self {
        self.navigator = Arc::new(navigator);
        self
    }

    /// Share a page cache with another orchestrator.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<PageCache>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    #[must_use]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Take the fetcher back once no task holds it, e.g. to shut a browser
    /// down after [`run`](Self::run).
    #[must_use]
    pub fn into_fetcher(self) -> Option<F> {
        Arc::try_unwrap(self.fetcher).ok()
    }

    #[must_use]
    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    #[must_use]
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Run the whole scrape.
    ///
    /// Per-URL failures are logged, reported and listed in the summary;
    /// they never abort the run.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Configuration`] when the base URL cannot be
    /// fetched. Nothing is dispatched in that case.
    pub async fn run(&self) -> ScrapeResult<ScrapeOutcome> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let base_url = self.config.base_url().clone();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_pages()));
        let mut log = RunLog::default();

        self.reporter.report_phase(ScrapePhase::Init);
        info!(
            target: "institute_scrape::orchestrator",
            "Starting scrape of {base_url} ({} concurrent pages)",
            self.config.max_concurrent_pages()
        );

        // Sections
        self.reporter.report_phase(ScrapePhase::DiscoverSections);
        let home = match self
            .cache
            .get_or_fetch(self.fetcher.as_ref(), base_url.as_str(), self.config.render_js())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                error!(
                    target: "institute_scrape::orchestrator",
                    "Base URL {base_url} is unreachable: {e}"
                );
                self.reporter.report_phase(ScrapePhase::Failed);
                return Err(ConfigError::Unreachable {
                    url: base_url.to_string(),
                    reason: e.to_string(),
                }
                .into());
            }
        };
        self.record_fetch(&mut log, &home);
        let sections = match self.navigator.discover_sections(&home, &base_url) {
            Ok(sections) => sections,
            Err(source) => {
                let err = ScrapeError::Extract {
                    url: home.url.clone(),
                    source,
                };
                self.record_failure(&mut log, base_url.as_str(), &err);
                Vec::new()
            }
        };
        info!(
            target: "institute_scrape::orchestrator",
            "Discovered {} sections",
            sections.len()
        );

        // Records
        self.reporter.report_phase(ScrapePhase::ExtractPerSection);
        let candidates = self.find_candidate_pages(&semaphore, &mut log).await;
        let routes = self.route(&candidates, &sections);
        debug!(
            target: "institute_scrape::orchestrator",
            "Dispatching {} pages for extraction",
            routes.len()
        );
        let pages = self.extract_pages(routes, &semaphore, &mut log).await;
        let listing_pages: HashSet<String> = pages
            .iter()
            .filter_map(|(page, _)| normalize_url_key(&page.url).ok())
            .collect();
        let mut dataset = self.merge_pages(sections, pages);
        if self.config.extract_project_content() {
            dataset.project_contents = self
                .fetch_project_contents(&dataset.projects, &listing_pages, &semaphore, &mut log)
                .await;
        }

        // Subpages
        if self.config.include_subpages() {
            self.reporter.report_phase(ScrapePhase::SubpageCrawl);
            dataset.all_pages = self
                .crawl_subpages(&dataset.sections, &semaphore, &mut log)
                .await;
        }

        // Aggregate
        self.reporter.report_phase(ScrapePhase::Aggregate);
        self.finish_dataset(&mut dataset);

        let summary = ScrapeSummary {
            started_at,
            pages_fetched: log.fetched.len(),
            failed_urls: log.failed,
            records: dataset.counts(),
            duration: clock.elapsed(),
        };
        info!(
            target: "institute_scrape::orchestrator",
            "Scrape finished: {} pages fetched, {} records, {} failed URLs",
            summary.pages_fetched,
            summary.total_records(),
            summary.failure_count()
        );
        self.reporter.report_completed(&summary);
        self.reporter.report_phase(ScrapePhase::Done);

        Ok(ScrapeOutcome { dataset, summary })
    }

    /// Resolve each kind's candidate paths to the first one that fetches.
    /// Kinds run concurrently; candidates within a kind are tried in order.
    async fn find_candidate_pages(
        &self,
        semaphore: &Arc<Semaphore>,
        log: &mut RunLog,
    ) -> Vec<(RecordKind, Url)> {
        let render_js = self.config.render_js();
        let jobs = RecordKind::PAGE_KINDS
            .into_iter()
            .map(|kind| {
                let candidates: Vec<Url> = self
                    .config
                    .target_urls(kind)
                    .into_iter()
                    .filter(|url| !self.config.is_excluded(url.as_str()))
                    .collect();
                let job = self.task_context().first_reachable(kind, candidates, render_js);
                (kind.name().to_string(), job)
            })
            .collect();

        let mut found = Vec::new();
        for (kind, (label, result)) in RecordKind::PAGE_KINDS
            .into_iter()
            .zip(run_bounded(semaphore, jobs).await)
        {
            match result {
                Ok(Some((url, page))) => {
                    debug!(
                        target: "institute_scrape::orchestrator",
                        "{label} page found at {url}"
                    );
                    self.record_fetch(log, &page);
                    found.push((kind, url));
                }
                Ok(None) => info!(
                    target: "institute_scrape::orchestrator",
                    "No {label} page among the candidate paths"
                ),
                Err(e) => warn!(
                    target: "institute_scrape::orchestrator",
                    "Probing {label} candidates failed: {e}"
                ),
            }
        }
        found
    }

    /// Pages to extract, in dispatch order: the candidate page found for
    /// each kind first, then sections whose title or URL carries the
    /// kind's keywords. A page reached for several kinds is fetched once.
    fn route(&self, candidates: &[(RecordKind, Url)], sections: &[Section]) -> Vec<Route> {
        let mut routes: Vec<Route> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for kind in RecordKind::PAGE_KINDS {
            let candidate = candidates
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, url)| url.clone());
            let by_keyword = sections
                .iter()
                .filter(|s| section_matches(s, kind))
                .filter_map(|s| Url::parse(&s.url).ok());
            for url in candidate.chain(by_keyword) {
                if self.config.is_excluded(url.as_str()) {
                    continue;
                }
                let Ok(key) = normalize_url_key(url.as_str()) else {
                    continue;
                };
                match index.get(&key) {
                    Some(&slot) => {
                        let kinds = &mut routes[slot].kinds;
                        if !kinds.contains(&kind) {
                            kinds.push(kind);
                        }
                    }
                    None => {
                        index.insert(key, routes.len());
                        routes.push(Route {
                            url,
                            kinds: vec![kind],
                        });
                    }
                }
            }
        }
        routes
    }

    async fn extract_pages(
        &self,
        routes: Vec<Route>,
        semaphore: &Arc<Semaphore>,
        log: &mut RunLog,
    ) -> Vec<(Arc<FetchResult>, PageRecords)> {
        let render_js = self.config.render_js();
        let jobs = routes
            .into_iter()
            .map(|route| {
                let url = route.url.to_string();
                (url, self.task_context().extract(route, render_js))
            })
            .collect();

        let mut pages = Vec::new();
        for (url, result) in run_bounded(semaphore, jobs).await {
            match result {
                Ok((page, records)) => {
                    self.record_fetch(log, &page);
                    for kind in RecordKind::PAGE_KINDS {
                        let count = records.count(kind);
                        if count > 0 {
                            self.reporter.report_records(&page.url, kind, count);
                        }
                    }
                    pages.push((page, records));
                }
                Err(e) => self.record_failure(log, &url, &e),
            }
        }
        pages
    }

    /// Merge every page's records per kind, in dispatch order.
    fn merge_pages(
        &self,
        sections: Vec<Section>,
        pages: Vec<(Arc<FetchResult>, PageRecords)>,
    ) -> ScrapeDataset {
        let policy = self.config.scalar_conflict();
        let mut pooled = PageRecords::default();
        for (_, records) in pages {
            pooled.news.extend(records.news);
            pooled.research_groups.extend(records.research_groups);
            pooled.publications.extend(records.publications);
            pooled.staff.extend(records.staff);
            pooled.contact.extend(records.contact);
            pooled.projects.extend(records.projects);
        }

        ScrapeDataset {
            sections,
            news: merge_records(pooled.news, policy),
            research_groups: merge_records(pooled.research_groups, policy),
            publications: merge_records(pooled.publications, policy),
            staff: merge_records(pooled.staff, policy),
            contact_info: merge_records(pooled.contact, policy)
                .into_iter()
                .next()
                .unwrap_or_default(),
            projects: merge_records(pooled.projects, policy),
            ..ScrapeDataset::default()
        }
    }

    /// Fetch project pages that are not one of the listing pages already
    /// extracted.
    async fn fetch_project_contents(
        &self,
        projects: &[Project],
        listing_pages: &HashSet<String>,
        semaphore: &Arc<Semaphore>,
        log: &mut RunLog,
    ) -> BTreeMap<String, ProjectDetail> {
        let mut seen = HashSet::new();
        let targets: Vec<(String, String)> = projects
            .iter()
            .filter_map(|p| {
                let key = normalize_url_key(p.url.as_deref()?).ok()?;
                Some((key, p.title.clone()))
            })
            .filter(|(key, _)| !listing_pages.contains(key) && !self.config.is_excluded(key))
            .filter(|(key, _)| seen.insert(key.clone()))
            .collect();
        if targets.is_empty() {
            return BTreeMap::new();
        }
        debug!(
            target: "institute_scrape::orchestrator",
            "Fetching {} project detail pages",
            targets.len()
        );

        let jobs = targets
            .into_iter()
            .map(|(url, title)| {
                let job = self
                    .task_context()
                    .project_detail(url.clone(), title, self.config.render_js());
                (url, job)
            })
            .collect();
        let mut contents = BTreeMap::new();
        for (url, result) in run_bounded(semaphore, jobs).await {
            match result {
                Ok((page, detail)) => {
                    self.record_fetch(log, &page);
                    contents.insert(url, detail);
                }
                Err(e) => self.record_failure(log, &url, &e),
            }
        }
        info!(
            target: "institute_scrape::orchestrator",
            "Extracted content from {} project pages",
            contents.len()
        );
        contents
    }

    /// Breadth-first crawl from the sections. Level 0 is the sections
    /// themselves; links are followed while the level is below `depth`.
    async fn crawl_subpages(
        &self,
        sections: &[Section],
        semaphore: &Arc<Semaphore>,
        log: &mut RunLog,
    ) -> BTreeMap<String, PageContent> {
        let depth = self.config.depth();
        let visited: DashSet<String> = DashSet::new();
        let mut frontier: Vec<String> = sections
            .iter()
            .filter_map(|s| normalize_url_key(&s.url).ok())
            .filter(|key| !self.config.is_excluded(key) && visited.insert(key.clone()))
            .collect();
        let mut all_pages = BTreeMap::new();

        for level in 0..=depth {
            if frontier.is_empty() {
                break;
            }
            let follow_links = level < depth;
            // Only the section pages are requested rendered.
            let render_js = self.config.render_js() && level == 0;
            debug!(
                target: "institute_scrape::orchestrator",
                "Subpage level {level}/{depth}: {} pages",
                frontier.len()
            );

            let jobs = frontier
                .drain(..)
                .map(|url| {
                    let job = self
                        .task_context()
                        .page_content(url.clone(), render_js, follow_links);
                    (url, job)
                })
                .collect();
            let mut next = Vec::new();
            for (url, result) in run_bounded(semaphore, jobs).await {
                match result {
                    Ok((page, content)) => {
                        self.record_fetch(log, &page);
                        for subpage in &content.subpages {
                            if !self.config.is_excluded(&subpage.url)
                                && visited.insert(subpage.url.clone())
                            {
                                next.push(subpage.url.clone());
                            }
                        }
                        all_pages.insert(url, content);
                    }
                    Err(e) => self.record_failure(log, &url, &e),
                }
            }
            frontier = next;
        }

        info!(
            target: "institute_scrape::orchestrator",
            "Extracted {} pages total",
            all_pages.len()
        );
        all_pages
    }

    fn task_context(&self) -> TaskContext<F> {
        TaskContext {
            fetcher: Arc::clone(&self.fetcher),
            cache: Arc::clone(&self.cache),
            extractors: Arc::clone(&self.extractors),
            navigator: Arc::clone(&self.navigator),
            base_url: self.config.base_url().clone(),
        }
    }

    /// Staff-derived groups, contact defaults and the publication cap.
    fn finish_dataset(&self, dataset: &mut ScrapeDataset) {
        if dataset.research_groups.is_empty() {
            dataset.research_groups = groups_from_staff(&dataset.staff);
            if !dataset.research_groups.is_empty() {
                info!(
                    target: "institute_scrape::orchestrator",
                    "Derived {} research groups from staff data",
                    dataset.research_groups.len()
                );
            }
        }

        let defaults = ContactInfo {
            institute_name: Some(self.config.institute_name().to_string()),
            country: Some(DEFAULT_COUNTRY.to_string()),
            website: Some(self.config.base_url().to_string()),
            ..ContactInfo::default()
        };
        dataset
            .contact_info
            .absorb(&defaults, ScalarConflict::PreferHigherPriority);

        dataset
            .publications
            .truncate(self.config.publications_limit());
    }

    fn record_fetch(&self, log: &mut RunLog, page: &FetchResult) {
        let key = normalize_url_key(&page.url).unwrap_or_else(|_| page.url.clone());
        if log.fetched.insert(key) {
            self.reporter.report_page_fetched(&page.url, page.rendered);
        }
    }

    fn record_failure(&self, log: &mut RunLog, url: &str, err: &ScrapeError) {
        let key = normalize_url_key(url).unwrap_or_else(|_| url.to_string());
        if !log.failed_keys.insert(key) {
            return;
        }
        warn!(target: "institute_scrape::orchestrator", "Skipping {url}: {err}");
        self.reporter.report_page_failed(url, err);
        log.failed.push(FailedUrl {
            url: url.to_string(),
            error: err.to_string(),
        });
    }
}

/// Run `jobs` on spawned tasks, at most as many at once as `semaphore`
/// has permits, and return every result in submission order once all of
/// them have finished.
async fn run_bounded<T, Fut>(
    semaphore: &Arc<Semaphore>,
    jobs: Vec<(String, Fut)>,
) -> Vec<(String, ScrapeResult<T>)>
where
    T: Send + 'static,
    Fut: Future<Output = ScrapeResult<T>> + Send + 'static,
{
    let mut results = Vec::with_capacity(jobs.len());
    let mut active_tasks = FuturesUnordered::new();

    for (index, (url, job)) in jobs.into_iter().enumerate() {
        let permit = match Arc::clone(semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                let err = ScrapeError::Task {
                    url: url.clone(),
                    message: e.to_string(),
                };
                results.push((index, url, Err(err)));
                continue;
            }
        };
        let task = tokio::spawn(async move {
            let _permit = permit;
            job.await
        });
        active_tasks.push(async move { (index, url, task.await) });
    }

    while let Some((index, url, joined)) = active_tasks.next().await {
        let result = joined.unwrap_or_else(|e| {
            error!(target: "institute_scrape::orchestrator", "Task for {url} panicked: {e}");
            Err(ScrapeError::Task {
                url: url.clone(),
                message: e.to_string(),
            })
        });
        results.push((index, url, result));
    }

    results.sort_by_key(|(index, ..)| *index);
    results
        .into_iter()
        .map(|(_, url, result)| (url, result))
        .collect()
}

fn merge_records<R: Record>(partials: Vec<Partial<R>>, policy: ScalarConflict) -> Vec<R> {
    merge(partials, policy)
        .into_iter()
        .map(|p| p.record)
        .collect()
}

fn section_matches(section: &Section, kind: RecordKind) -> bool {
    let title = section.title.to_lowercase();
    let url = section.url.to_lowercase();
    kind.keywords()
        .iter()
        .any(|word| title.contains(word) || url.contains(word))
}

/// Group label for one staff member: a department naming a group, or the
/// text after a group word in the position.
fn group_label(member: &StaffMember) -> Option<String> {
    if let Some(department) = member.department.as_deref() {
        let lower = department.to_lowercase();
        if GROUP_WORDS.iter().any(|w| lower.contains(w)) {
            return Some(department.trim().to_string());
        }
    }
    let position = member.position.as_deref()?;
    let name = POSITION_GROUP.captures(position)?.get(1)?.as_str().trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Research groups inferred from staff affiliations, in first-seen order.
fn groups_from_staff(staff: &[StaffMember]) -> Vec<ResearchGroup> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for member in staff {
        let Some(label) = group_label(member) else {
            continue;
        };
        let key = identity_text(&label);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((label, Vec::new()));
            groups.len() - 1
        });
        merge_list(&mut groups[slot].1, std::slice::from_ref(&member.name));
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() >= MIN_DERIVED_GROUP_MEMBERS)
        .map(|(name, researchers)| ResearchGroup {
            description: format!(
                "Group derived from staff information with {} members.",
                researchers.len()
            ),
            researchers_text: researchers.join(", "),
            name,
            researchers,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchError;

    struct MapFetcher(HashMap<String, String>);

    impl PageFetcher for MapFetcher {
        async fn fetch(&self, url: &str, _render_js: bool) -> Result<FetchResult, FetchError> {
            self.0
                .get(url)
                .map(|html| FetchResult::new(url, html.clone()))
                .ok_or_else(|| FetchError::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    fn config() -> ScrapeConfig {
        ScrapeConfig::builder()
            .base_url("https://inst.example.org/")
            .output_dir("out")
            .targets(RecordKind::News, vec!["news".into()])
            .targets(RecordKind::Staff, vec!["people".into(), "news".into()])
            .targets(RecordKind::ResearchGroups, vec![])
            .targets(RecordKind::Publications, vec![])
            .targets(RecordKind::ContactInfo, vec![])
            .targets(RecordKind::Projects, vec![])
            .build()
            .unwrap()
    }

    fn member(name: &str, position: Option<&str>, department: Option<&str>) -> StaffMember {
        StaffMember {
            name: name.into(),
            position: position.map(str::to_string),
            department: department.map(str::to_string),
            source_url: "https://inst.example.org/people".into(),
            ..Default::default()
        }
    }

    fn at(path: &str) -> Url {
        Url::parse("https://inst.example.org/").unwrap().join(path).unwrap()
    }

    #[test]
    fn routes_merge_kinds_per_page() {
        let orchestrator = ScrapeOrchestrator::new(config(), MapFetcher(HashMap::new()));
        let candidates = vec![
            (RecordKind::News, at("news")),
            (RecordKind::Staff, at("people")),
        ];
        let sections = vec![
            Section::new("Noticias", "https://inst.example.org/news#latest"),
            Section::new("Team news", "https://inst.example.org/news"),
            Section::new("Contact", "https://inst.example.org/contact"),
            Section::new("About", "https://inst.example.org/about"),
        ];
        let routes = orchestrator.route(&candidates, &sections);
        let got: Vec<_> = routes
            .iter()
            .map(|r| (r.url.path().to_string(), r.kinds.clone()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("/news".to_string(), vec![RecordKind::News, RecordKind::Staff]),
                ("/people".to_string(), vec![RecordKind::Staff]),
                ("/contact".to_string(), vec![RecordKind::ContactInfo]),
            ]
        );
    }

    #[tokio::test]
    async fn candidates_stop_at_first_reachable_path() {
        let pages = HashMap::from([
            ("https://inst.example.org/".to_string(), "<html><body><p>Home</p></body></html>".to_string()),
            ("https://inst.example.org/news".to_string(), "<html><body><p>News</p></body></html>".to_string()),
        ]);
        let orchestrator = ScrapeOrchestrator::new(config(), MapFetcher(pages));
        let mut log = RunLog::default();
        let semaphore = Arc::new(Semaphore::new(2));

        let found = orchestrator.find_candidate_pages(&semaphore, &mut log).await;

        assert_eq!(
            found,
            vec![(RecordKind::News, at("news")), (RecordKind::Staff, at("news"))]
        );
        assert!(log.failed.is_empty());
        assert_eq!(log.fetched.len(), 1);
    }

    #[test]
    fn staff_groups_need_two_members() {
        let staff = vec![
            member("Ana Pérez", Some("Researcher, Group: Analog Design"), None),
            member("Luis Gómez", None, Some("Analog Design Group")),
            member("Eva Ruiz", Some("PhD student, group: analog design"), None),
            member("Juan Sanz", Some("Technician"), Some("Digital Design Group")),
            member("Marta Gil", Some("Professor"), None),
        ];
        let groups = groups_from_staff(&staff);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Analog Design");
        assert_eq!(groups[0].researchers, vec!["Ana Pérez", "Eva Ruiz"]);
        assert_eq!(groups[0].researchers_text, "Ana Pérez, Eva Ruiz");
        assert!(groups[0].description.contains("2 members"));
    }

    #[tokio::test]
    async fn unreachable_base_url_is_fatal() {
        let orchestrator = ScrapeOrchestrator::new(config(), MapFetcher(HashMap::new()));
        let err = orchestrator.run().await.unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            ScrapeError::Configuration(ConfigError::Unreachable { .. })
        ));
    }

    #[tokio::test]
    async fn contact_defaults_fill_missing_fields() {
        let pages = HashMap::from([(
            "https://inst.example.org/".to_string(),
            "<html><body><nav><ul><li><a href=\"/about\">About</a></li></ul></nav></body></html>"
                .to_string(),
        )]);
        let outcome = ScrapeOrchestrator::new(config(), MapFetcher(pages))
            .run()
            .await
            .unwrap();
        let contact = &outcome.dataset.contact_info;
        assert_eq!(contact.country.as_deref(), Some("Spain"));
        assert_eq!(contact.website.as_deref(), Some("https://inst.example.org/"));
        assert!(contact.institute_name.is_some());
        assert_eq!(outcome.summary.pages_fetched, 1);
        assert_eq!(outcome.summary.failure_count(), 0);
    }
}
