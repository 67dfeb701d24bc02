//! Project detail pages.
//!
//! A project's own page is read as a whole rather than as a list of
//! records: heading sections, images, grant data, the project period and
//! the team.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::document::{
    IMAGE_SELECTOR, attr, content_root, heading_level, lines_of, next_elements, parse_document,
    text_of,
};
use super::errors::ExtractError;
use super::projects::PERIOD;
use crate::fetcher::FetchResult;
use crate::normalizer::{collapse_whitespace, normalize_text};
use crate::records::{ContentSection, FundingInfo, PageImage, PeriodInfo, ProjectDetail};

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, .title, .page-title, .article-title")
        .expect("BUG: hardcoded CSS selector for detail titles is invalid")
});

static DOCUMENT_TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("title").expect("BUG: hardcoded CSS selector 'title' is invalid")
});

static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6")
        .expect("BUG: hardcoded CSS selector for headings is invalid")
});

static LIST_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("ul, ol").expect("BUG: hardcoded CSS selector for lists is invalid")
});

static ITEM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("li").expect("BUG: hardcoded CSS selector 'li' is invalid")
});

static REFERENCE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:RTI|TEC|BES|FPI|FPU|ERC|H2020|PID)[A-Z0-9-]+[-/]\d+")
        .expect("BUG: hardcoded grant reference regex is invalid")
});

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[,.]\d+)?)\s*(?:k€|€|EUR\b|euros?\b)")
        .expect("BUG: hardcoded funding amount regex is invalid")
});

const AGENCIES: &[&str] = &[
    "Ministerio",
    "MINECO",
    "MICINN",
    "European Commission",
    "EU",
    "European Union",
    "H2020",
    "Horizon",
    "CDTI",
    "Junta",
    "Andalucía",
    "National",
    "Regional",
    "Internacional",
];

static AGENCY_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    AGENCIES
        .iter()
        .map(|name| {
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(name)))
                .expect("BUG: hardcoded agency regex is invalid");
            (*name, re)
        })
        .collect()
});

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:duración|duration)[:\s]+(\d+)")
        .expect("BUG: hardcoded duration regex is invalid")
});

static PRINCIPAL_INVESTIGATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:IP|investigador principal|principal investigator)\b[:\s]+([^.;\n]+)")
        .expect("BUG: hardcoded principal investigator regex is invalid")
});

static TEAM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:equipo|team|miembros|members)\b[^\n.]*:\s*([^\n]+)")
        .expect("BUG: hardcoded team line regex is invalid")
});

static MEMBER_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i),|;|\by\b|\band\b").expect("BUG: hardcoded member separator regex is invalid")
});

const TEAM_WORDS: &[&str] = &["equipo", "team", "investigador", "researcher", "miembro", "member"];
const MIN_MEMBER_CHARS: usize = 4;

/// Read a project's detail page. `fallback_title` is used when the page
/// has neither a heading nor a `<title>`.
///
/// # Errors
///
/// Returns [`ExtractError::Parse`] when the page is not HTML.
pub fn extract_project_detail(
    page: &FetchResult,
    fallback_title: &str,
) -> Result<ProjectDetail, ExtractError> {
    let doc = parse_document(&page.html)?;
    let page_url = Url::parse(&page.url).ok();
    let root = content_root(&doc);
    let text = lines_of(root);

    let title = page_title(&doc).unwrap_or_else(|| normalize_text(fallback_title));
    let funding = funding_info(&text);
    let period = period_info(&text);
    Ok(ProjectDetail {
        url: page.url.clone(),
        title,
        content: normalize_text(&text_of(root)),
        sections: content_sections(root),
        images: page_url.map(|u| images(&doc, &u)).unwrap_or_default(),
        funding_info: (!funding.is_empty()).then_some(funding),
        period_info: (!period.is_empty()).then_some(period),
        team_members: team_members(root, &text),
    })
}

fn page_title(doc: &Html) -> Option<String> {
    doc.select(&TITLE_SELECTOR)
        .chain(doc.select(&DOCUMENT_TITLE_SELECTOR))
        .map(|el| normalize_text(&text_of(el)))
        .find(|t| !t.is_empty())
}

/// Each heading with the text of the siblings up to the next heading.
fn content_sections(root: ElementRef<'_>) -> Vec<ContentSection> {
    root.select(&HEADING_SELECTOR)
        .filter_map(|heading| {
            let title = normalize_text(&text_of(heading));
            if title.is_empty() {
                return None;
            }
            let content = next_elements(heading)
                .take_while(|el| {
                    heading_level(*el).is_none() && el.select(&HEADING_SELECTOR).next().is_none()
                })
                .map(text_of)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            Some(ContentSection { title, content })
        })
        .collect()
}

fn images(doc: &Html, page_url: &Url) -> Vec<PageImage> {
    let mut seen = HashSet::new();
    doc.select(&IMAGE_SELECTOR)
        .filter_map(|img| {
            let src = attr(img, "src")?;
            if src.starts_with("data:") {
                return None;
            }
            let url = page_url.join(src).ok()?.to_string();
            seen.insert(url.clone()).then(|| PageImage {
                url,
                alt: attr(img, "alt").map(collapse_whitespace).unwrap_or_default(),
                title: attr(img, "title").map(collapse_whitespace).unwrap_or_default(),
            })
        })
        .collect()
}

fn push_unique(out: &mut Vec<String>, value: String) {
    if !out.contains(&value) {
        out.push(value);
    }
}

fn funding_info(text: &str) -> FundingInfo {
    let mut info = FundingInfo::default();
    for m in REFERENCE_CODE.find_iter(text) {
        push_unique(&mut info.reference_codes, m.as_str().to_string());
    }
    for c in AMOUNT.captures_iter(text) {
        push_unique(&mut info.amounts, c[1].to_string());
    }
    info.agencies = AGENCY_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(name, _)| (*name).to_string())
        .collect();
    info
}

fn period_info(text: &str) -> PeriodInfo {
    let mut info = PeriodInfo::default();
    if let Some(c) = PERIOD.captures(text) {
        info.full_period = Some(c[0].to_string());
        info.start_year = Some(c[1].to_string());
        info.end_year = Some(c[2].to_string());
    }
    info.duration = DURATION.captures(text).map(|c| c[1].to_string());
    info
}

/// Items of lists that talk about the team, or failing that the
/// principal investigator and a `Team: a, b and c` line from the text.
fn team_members(root: ElementRef<'_>, text: &str) -> Vec<String> {
    let mut members = Vec::new();
    for list in root.select(&LIST_SELECTOR) {
        let list_text = text_of(list).to_lowercase();
        if !TEAM_WORDS.iter().any(|w| list_text.contains(w)) {
            continue;
        }
        for item in list.select(&ITEM_SELECTOR) {
            let member = text_of(item);
            if member.chars().count() >= MIN_MEMBER_CHARS {
                push_unique(&mut members, member);
            }
        }
    }
    if !members.is_empty() {
        return members;
    }

    if let Some(c) = PRINCIPAL_INVESTIGATOR.captures(text) {
        let pi = c[1].trim();
        if !pi.is_empty() {
            members.push(format!("Principal Investigator: {pi}"));
        }
    }
    if let Some(c) = TEAM_LINE.captures(text) {
        for member in MEMBER_SEPARATOR.split(&c[1]) {
            let member = collapse_whitespace(member);
            if member.chars().count() >= MIN_MEMBER_CHARS {
                push_unique(&mut members, member);
            }
        }
    }
    members
}
