//! Project strategies.
//!
//! 1. `container`: project cards with title, description and an `IP:` line.
//! 2. `acronym`: an all-caps acronym link whose parent is followed by the
//!    project description and an `IP:` line.
//! 3. `text` (fallback): the acronym / description / `IP:` triple in the
//!    page text.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::document::{content_root, first_link, first_text, lines_of, parse_selector, text_of};
use super::errors::StructuralParseError;
use super::extractor::Extractor;
use super::strategy::{Strategy, Trigger};
use crate::records::{PageContext, Project};

static CARD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#".project, .project-item, div[class*="project"], .item"#)
        .expect("BUG: hardcoded CSS selector for project cards is invalid")
});

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h2, h3, h4, .title, .project-title, strong, b")
        .expect("BUG: hardcoded CSS selector for project titles is invalid")
});

static DESCRIPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p, .description, .content")
        .expect("BUG: hardcoded CSS selector for project descriptions is invalid")
});

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a").expect("BUG: hardcoded CSS selector 'a' is invalid")
});

static ACRONYM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9-]{3,}$").expect("BUG: hardcoded acronym regex is invalid")
});

static PRINCIPAL_INVESTIGATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"IP:\s*([^;.,\n]+)").expect("BUG: hardcoded IP regex is invalid")
});

pub(super) static PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*[-–]\s*(\d{4}|\w+)").expect("BUG: hardcoded period regex is invalid")
});

static FUNDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:financiado por|funded by)[^\n.]+")
        .expect("BUG: hardcoded funding regex is invalid")
});

static PROJECT_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z0-9-]{3,})[ \t]*\n+[ \t]*([^\n]{20,})[ \t]*\n+[ \t]*IP:[ \t]*([^\n]+)")
        .expect("BUG: hardcoded project text regex is invalid")
});

const NAV_WORDS: &[&str] = &["menu", "login", "register", "inicio", "home"];
const MIN_TITLE_CHARS: usize = 4;
const MIN_DESCRIPTION_CHARS: usize = 20;

fn principal_investigator(text: &str) -> Option<String> {
    PRINCIPAL_INVESTIGATOR
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

fn period_in(text: &str) -> String {
    PERIOD
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn funding_in(text: &str) -> Option<String> {
    FUNDING.find(text).map(|m| m.as_str().trim().to_string())
}

fn acronym_title(acronym: &str, description: &str) -> String {
    format!("{acronym} - {description}")
}

/// Project cards.
#[derive(Debug, Clone)]
pub struct ProjectContainerStrategy {
    card: Selector,
}

impl Default for ProjectContainerStrategy {
    fn default() -> Self {
        Self {
            card: CARD_SELECTOR.clone(),
        }
    }
}

impl ProjectContainerStrategy {
    /// Use a site-specific card selector.
    pub fn with_selector(card: &str) -> Result<Self, StructuralParseError> {
        Ok(Self {
            card: parse_selector(card)?,
        })
    }

    fn read_card(card: ElementRef<'_>, ctx: &PageContext<'_>) -> Option<Project> {
        let title = first_text(card, &TITLE_SELECTOR)?;
        let lower = title.to_lowercase();
        if title.chars().count() < MIN_TITLE_CHARS || NAV_WORDS.iter().any(|w| lower.contains(w)) {
            return None;
        }
        let description = card
            .select(&DESCRIPTION_SELECTOR)
            .map(text_of)
            .filter(|t| !t.is_empty() && !t.starts_with("IP:"))
            .collect::<Vec<_>>()
            .join(" ");
        let card_text = text_of(card);
        Some(Project {
            period: period_in(&description),
            funding: funding_in(&description),
            url: first_link(card, ctx.page_url).or_else(|| Some(ctx.page_url.to_string())),
            principal_investigator: principal_investigator(&card_text),
            title,
            description,
        })
    }
}

impl Strategy<Project> for ProjectContainerStrategy {
    fn name(&self) -> &'static str {
        "container"
    }

    fn attempt(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<Vec<Project>, StructuralParseError> {
        Ok(doc
            .select(&self.card)
            .filter_map(|card| Self::read_card(card, ctx))
            .collect())
    }
}

/// Acronym links followed by a description block.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectAcronymStrategy;

impl ProjectAcronymStrategy {
    fn read_anchor(anchor: ElementRef<'_>, ctx: &PageContext<'_>) -> Option<Project> {
        let acronym = text_of(anchor);
        if !ACRONYM.is_match(&acronym) {
            return None;
        }
        let parent = anchor.parent().and_then(ElementRef::wrap)?;
        let mut following = parent.next_siblings().filter_map(ElementRef::wrap);
        let description = text_of(following.next()?);
        if description.chars().count() <= MIN_DESCRIPTION_CHARS || description.starts_with("IP:") {
            return None;
        }
        let pi = following
            .next()
            .map(text_of)
            .filter(|t| t.contains("IP:"))
            .and_then(|t| principal_investigator(&t));
        Some(Project {
            title: acronym_title(&acronym, &description),
            period: period_in(&description),
            funding: funding_in(&description),
            url: first_link(anchor, ctx.page_url).or_else(|| Some(ctx.page_url.to_string())),
            principal_investigator: pi,
            description,
        })
    }
}

impl Strategy<Project> for ProjectAcronymStrategy {
    fn name(&self) -> &'static str {
        "acronym"
    }

    fn attempt(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<Vec<Project>, StructuralParseError> {
        Ok(doc
            .select(&ANCHOR_SELECTOR)
            .filter_map(|a| Self::read_anchor(a, ctx))
            .collect())
    }
}

/// Acronym, description and `IP:` lines in the page text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectTextStrategy;

impl Strategy<Project> for ProjectTextStrategy {
    fn name(&self) -> &'static str {
        "text"
    }

    fn trigger(&self) -> Trigger {
        Trigger::BelowYield
    }

    fn attempt(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<Vec<Project>, StructuralParseError> {
        let text = lines_of(content_root(doc));
        Ok(PROJECT_TEXT
            .captures_iter(&text)
            .map(|c| {
                let description = c[2].trim().to_string();
                Project {
                    title: acronym_title(&c[1], &description),
                    period: period_in(&description),
                    funding: funding_in(&description),
                    url: Some(ctx.page_url.to_string()),
                    principal_investigator: Some(c[3].trim().to_string()),
                    description,
                }
            })
            .collect())
    }
}

/// The stock project extractor.
#[must_use]
pub fn extractor() -> Extractor<Project> {
    Extractor::new(vec![
        Box::new(ProjectContainerStrategy::default()),
        Box::new(ProjectAcronymStrategy),
        Box::new(ProjectTextStrategy),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn run<S: Strategy<Project>>(strategy: &S, html: &str) -> Vec<Project> {
        let base = Url::parse("https://inst.example.org/").unwrap();
        let page = Url::parse("https://inst.example.org/es/proyectos.php").unwrap();
        let ctx = PageContext {
            base_url: &base,
            page_url: &page,
        };
        strategy.attempt(&Html::parse_document(html), &ctx).unwrap()
    }

    #[test]
    fn card_reads_period_funding_and_pi() {
        let html = r#"<div class="project-item">
            <h3><a href="/p/sensa">SENSA imaging</a></h3>
            <p>Smart CMOS sensors, 2021 - 2024. Funded by the State Research Agency</p>
            <p>IP: Ana Pérez</p>
        </div>"#;
        let projects = run(&ProjectContainerStrategy::default(), html);
        assert_eq!(projects.len(), 1);
        let p = &projects[0];
        assert_eq!(p.title, "SENSA imaging");
        assert_eq!(p.period, "2021 - 2024");
        assert_eq!(p.funding.as_deref(), Some("Funded by the State Research Agency"));
        assert_eq!(p.principal_investigator.as_deref(), Some("Ana Pérez"));
        assert_eq!(p.url.as_deref(), Some("https://inst.example.org/p/sensa"));
    }

    #[test]
    fn navigation_cards_are_skipped() {
        let html = r#"<div class="item"><strong>Home</strong><p>Back to start</p></div>"#;
        assert!(run(&ProjectContainerStrategy::default(), html).is_empty());
    }

    #[test]
    fn acronym_link_reads_following_blocks() {
        let html = r#"<main>
            <p><a href="/proyectos/rhea">RHEA-2</a></p>
            <p>Radiation-hardened electronics for space applications</p>
            <p>IP: Luis Gómez</p>
        </main>"#;
        let projects = run(&ProjectAcronymStrategy, html);
        assert_eq!(projects.len(), 1);
        assert_eq!(
            projects[0].title,
            "RHEA-2 - Radiation-hardened electronics for space applications"
        );
        assert_eq!(projects[0].principal_investigator.as_deref(), Some("Luis Gómez"));
    }

    #[test]
    fn text_triples_are_found() {
        let html = "<main><p>NANOCHIP</p><p>Nanoscale devices for neuromorphic computing</p><p>IP: Marta Ruiz</p></main>";
        let projects = run(&ProjectTextStrategy, html);
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].principal_investigator.as_deref(), Some("Marta Ruiz"));
    }
}
