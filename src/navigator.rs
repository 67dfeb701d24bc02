//! Site navigator.
//!
//! Turns the home page into [`Section`]s and any page into the list of
//! content links worth following, dropping mail/script/anchor links,
//! external hosts, language switchers and URLs matching the configured
//! exclusion globs.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::ScrapeConfig;
use crate::fetcher::FetchResult;
use crate::normalizer::normalize_text;
use crate::page_extractor::document::{attr, content_root, parse_document, text_of};
use crate::page_extractor::{ExtractError, Extractor, sections};
use crate::records::{PageContent, Section, Subpage};
use crate::utils::url_utils::title_from_url;
use crate::utils::{normalize_url_key, resolve_link, same_site};

static SUBPAGE_LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".item-page a, .content a, #content a, main a, article a, nav a")
        .expect("BUG: hardcoded CSS selector for content links is invalid")
});

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("title").expect("BUG: hardcoded CSS selector 'title' is invalid")
});

static HEADING_TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, .page-title")
        .expect("BUG: hardcoded CSS selector for page headings is invalid")
});

/// Links to bare language roots such as `/index.php/es/` or `/en`.
static LANGUAGE_ROOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(?:index\.php/)?(?:es|en|ca|fr|de)(?:-[a-z]{2})?/?$")
        .expect("BUG: hardcoded language root regex is invalid")
});

const LANGUAGE_LABELS: &[&str] = &[
    "es", "en", "ca", "español", "espanol", "english", "castellano", "català", "inglés",
];

const SKIPPED_EXTENSIONS: &[&str] = &[".pdf", ".doc", ".docx", ".zip", ".jpg", ".png"];

/// Discovers sections and subpage links.
#[derive(Debug)]
pub struct SiteNavigator {
    exclusions: Vec<Regex>,
    sections: Extractor<Section>,
}

impl Default for SiteNavigator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl SiteNavigator {
    #[must_use]
    pub fn new(exclusions: Vec<Regex>) -> Self {
        Self {
            exclusions,
            sections: sections::extractor(),
        }
    }

    /// Navigator using the config's compiled exclusion globs and policies.
    #[must_use]
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            exclusions: config.excluded_patterns_compiled.clone(),
            sections: sections::extractor()
                .with_min_yield(config.min_strategy_yield())
                .with_conflict_policy(config.scalar_conflict()),
        }
    }

    /// Replace the section extractor (site-specific menu selectors).
    #[must_use]
    pub fn with_section_extractor(mut self, extractor: Extractor<Section>) -> Self {
        self.sections = extractor;
        self
    }

    /// Sections from the home page navigation, in document order.
    ///
    /// Sections are unique by URL; identifiers that collide get `_2`,
    /// `_3`, ... suffixes.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Parse`] when the page is not HTML.
    pub fn discover_sections(
        &self,
        page: &FetchResult,
        base_url: &Url,
    ) -> Result<Vec<Section>, ExtractError> {
        let mut sections: Vec<Section> = self
            .sections
            .extract(page, base_url)?
            .into_iter()
            .filter(|s| !self.is_excluded(&s.url))
            .collect();
        dedup_section_ids(&mut sections);
        debug!(
            target: "institute_scrape::navigator",
            "{} sections discovered on {}",
            sections.len(),
            page.url
        );
        Ok(sections)
    }

    /// Content links of `page` that stay on the site, de-duplicated by
    /// normalised URL, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Parse`] when the page is not HTML.
    pub fn discover_subpages(
        &self,
        page: &FetchResult,
        base_url: &Url,
    ) -> Result<Vec<Subpage>, ExtractError> {
        let doc = parse_document(&page.html)?;
        let page_url = Url::parse(&page.url).unwrap_or_else(|_| base_url.clone());
        Ok(self.subpages_of(&doc, &page_url, base_url))
    }

    /// Title, text and (optionally) subpage links of one page.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Parse`] when the page is not HTML.
    pub fn page_content(
        &self,
        page: &FetchResult,
        base_url: &Url,
        with_links: bool,
    ) -> Result<PageContent, ExtractError> {
        let doc = parse_document(&page.html)?;
        let page_url = Url::parse(&page.url).unwrap_or_else(|_| base_url.clone());
        let title = doc
            .select(&TITLE_SELECTOR)
            .map(text_of)
            .find(|t| !t.is_empty())
            .or_else(|| {
                doc.select(&HEADING_TITLE_SELECTOR)
                    .map(text_of)
                    .find(|t| !t.is_empty())
            })
            .unwrap_or_default();
        let subpages = if with_links {
            self.subpages_of(&doc, &page_url, base_url)
        } else {
            Vec::new()
        };
        Ok(PageContent {
            url: page.url.clone(),
            title: normalize_text(&title),
            content: normalize_text(&text_of(content_root(&doc))),
            subpages,
        })
    }

    fn subpages_of(&self, doc: &Html, page_url: &Url, base_url: &Url) -> Vec<Subpage> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for anchor in doc.select(&SUBPAGE_LINK_SELECTOR) {
            let Some(href) = attr(anchor, "href") else {
                continue;
            };
            let Some(url) = resolve_link(page_url, href) else {
                continue;
            };
            if !same_site(&url, base_url) || has_skipped_extension(&url) || is_language_switch(anchor, &url) {
                continue;
            }
            let Ok(key) = normalize_url_key(url.as_str()) else {
                continue;
            };
            if self.is_excluded(&key) || !seen.insert(key.clone()) {
                continue;
            }
            let title = Some(text_of(anchor))
                .filter(|t| !t.is_empty())
                .or_else(|| attr(anchor, "title").map(str::to_string))
                .unwrap_or_else(|| title_from_url(&url));
            out.push(Subpage { title, url: key });
        }
        out
    }

    fn is_excluded(&self, url: &str) -> bool {
        self.exclusions.iter().any(|re| re.is_match(url))
    }
}

fn has_skipped_extension(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    SKIPPED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn is_language_switch(anchor: ElementRef<'_>, url: &Url) -> bool {
    if anchor.value().attr("hreflang").is_some() {
        return true;
    }
    let label = text_of(anchor).to_lowercase();
    if LANGUAGE_LABELS.contains(&label.as_str()) {
        return true;
    }
    if LANGUAGE_ROOT.is_match(url.path()) {
        return true;
    }
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().classes().any(|c| c.contains("lang")))
}

/// Suffix colliding identifiers in document order.
fn dedup_section_ids(sections: &mut [Section]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for section in sections.iter_mut() {
        let n = counts.entry(section.section_id.clone()).or_insert(0);
        *n += 1;
        if *n > 1 {
            section.section_id = format!("{}_{}", section.section_id, n);
        }
    }
}
