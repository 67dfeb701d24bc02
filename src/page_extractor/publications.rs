//! Publication strategies.
//!
//! 1. `container`: citation elements (`.publication`, `.paper`, ...)
//!    parsed into authors / title / venue / year / DOI.
//! 2. `text` (fallback): citation-shaped lines in the content area.
//! 3. `pdf` (fallback): descriptive links to PDF files.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::document::{attr, content_root, first_link, lines_of, parse_selector, text_of};
use super::errors::StructuralParseError;
use super::extractor::Extractor;
use super::strategy::{Strategy, Trigger};
use crate::records::{PageContext, Publication};
use crate::utils::string_utils::safe_truncate_chars;
use crate::utils::{DEFAULT_PUBLICATIONS_LIMIT, resolve_link};

static CITATION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".publication, .paper, .article, li.publication-item")
        .expect("BUG: hardcoded CSS selector for citations is invalid")
});

static PDF_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href$=".pdf"], a[href$=".PDF"]"#)
        .expect("BUG: hardcoded CSS selector for PDF links is invalid")
});

static QUOTED_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["“]([^"”]{5,})["”]"#).expect("BUG: hardcoded quoted title regex is invalid")
});

static YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b((?:19|20)\d{2})\b").expect("BUG: hardcoded year regex is invalid")
});

static DOI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b10\.\d{4,9}/[^\s,;]+").expect("BUG: hardcoded DOI regex is invalid")
});

/// `Authors. Title. Venue, 2021`
static AUTHORS_TITLE_VENUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^([A-Z][^.\n]{2,200}?(?:et al)?)\.\s+([A-Z][^.\n]{10,300})\.\s+([^\n]{3,200}?),?\s*((?:19|20)\d{2})",
    )
    .expect("BUG: hardcoded citation regex is invalid")
});

/// `Authors (2021). Title. Venue`
static AUTHORS_YEAR_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([A-Z][^(\n]{2,200}?)\s*\(((?:19|20)\d{2})\)\.?\s+([^.\n]{10,300})\.\s*([^\n]*)")
        .expect("BUG: hardcoded author-year citation regex is invalid")
});

/// `Authors, "Title", Venue, 2021`
static AUTHORS_QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^([^"“\n]{3,200}?),?\s*["“]([^"”\n]{10,300})["”],?\s*([^\n]*?)((?:19|20)\d{2})?[.\s]*$"#)
        .expect("BUG: hardcoded quoted citation regex is invalid")
});

const MIN_PDF_TEXT_CHARS: usize = 10;
const MAX_PDF_TITLE_CHARS: usize = 150;

fn year_in(text: &str) -> Option<u16> {
    YEAR.captures(text).and_then(|c| c[1].parse().ok())
}

fn doi_in(text: &str) -> Option<String> {
    DOI.find(text).map(|m| m.as_str().to_string())
}

fn trim_punct(s: &str) -> String {
    s.trim()
        .trim_matches(|c: char| matches!(c, ',' | '.' | ';' | ':'))
        .trim()
        .to_string()
}

/// Split one citation string into structured fields.
///
/// A quoted title splits the citation; text before it is the authors and
/// text after it the venue. Without quotes only year and DOI are lifted
/// and the verbatim text stays in `full_text`.
pub fn parse_citation(citation: &str) -> Publication {
    let mut publication = Publication {
        year: year_in(citation),
        doi: doi_in(citation),
        full_text: citation.to_string(),
        ..Default::default()
    };
    if let Some(caps) = QUOTED_TITLE.captures(citation)
        && let Some(whole) = caps.get(0)
    {
        publication.title = trim_punct(&caps[1]);
        publication.authors = trim_punct(&citation[..whole.start()]);
        let after = &citation[whole.end()..];
        let venue = YEAR.split(after).next().unwrap_or_default();
        publication.venue = trim_punct(DOI.split(venue).next().unwrap_or_default());
    }
    publication
}

/// Citation elements.
#[derive(Debug, Clone)]
pub struct PublicationContainerStrategy {
    citation: Selector,
}

impl Default for PublicationContainerStrategy {
    fn default() -> Self {
        Self {
            citation: CITATION_SELECTOR.clone(),
        }
    }
}

impl PublicationContainerStrategy {
    /// Use a site-specific citation selector.
    pub fn with_selector(citation: &str) -> Result<Self, StructuralParseError> {
        Ok(Self {
            citation: parse_selector(citation)?,
        })
    }
}

impl Strategy<Publication> for PublicationContainerStrategy {
    fn name(&self) -> &'static str {
        "container"
    }

    fn attempt(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<Vec<Publication>, StructuralParseError> {
        Ok(doc
            .select(&self.citation)
            .filter_map(|el| {
                let text = text_of(el);
                if text.is_empty() {
                    return None;
                }
                let mut publication = parse_citation(&text);
                publication.url = first_link(el, ctx.page_url);
                Some(publication)
            })
            .collect())
    }
}

/// Citation-shaped lines in the page text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicationTextStrategy;

impl Strategy<Publication> for PublicationTextStrategy {
    fn name(&self) -> &'static str {
        "text"
    }

    fn trigger(&self) -> Trigger {
        Trigger::BelowYield
    }

    fn attempt(&self, doc: &Html, _ctx: &PageContext<'_>) -> Result<Vec<Publication>, StructuralParseError> {
        let text = lines_of(content_root(doc));
        let mut out: Vec<Publication> = Vec::new();

        for c in AUTHORS_TITLE_VENUE.captures_iter(&text) {
            out.push(Publication {
                authors: trim_punct(&c[1]),
                title: trim_punct(&c[2]),
                venue: trim_punct(&c[3]),
                year: c[4].parse().ok(),
                doi: doi_in(&c[0]),
                url: None,
                full_text: c[0].trim().to_string(),
            });
        }
        for c in AUTHORS_YEAR_TITLE.captures_iter(&text) {
            out.push(Publication {
                authors: trim_punct(&c[1]),
                title: trim_punct(&c[3]),
                venue: trim_punct(&c[4]),
                year: c[2].parse().ok(),
                doi: doi_in(&c[0]),
                url: None,
                full_text: c[0].trim().to_string(),
            });
        }
        for c in AUTHORS_QUOTED.captures_iter(&text) {
            out.push(Publication {
                authors: trim_punct(&c[1]),
                title: trim_punct(&c[2]),
                venue: trim_punct(&c[3]),
                year: c.get(4).and_then(|m| m.as_str().parse().ok()),
                doi: doi_in(&c[0]),
                url: None,
                full_text: c[0].trim().to_string(),
            });
        }
        Ok(out)
    }
}

/// Links to PDF files whose anchor text reads like a title.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicationPdfStrategy;

impl Strategy<Publication> for PublicationPdfStrategy {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn trigger(&self) -> Trigger {
        Trigger::BelowYield
    }

    fn attempt(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<Vec<Publication>, StructuralParseError> {
        Ok(doc
            .select(&PDF_SELECTOR)
            .filter_map(|a| {
                let text = text_of(a);
                if text.chars().count() <= MIN_PDF_TEXT_CHARS {
                    return None;
                }
                let url = attr(a, "href").and_then(|h| resolve_link(ctx.page_url, h));
                Some(Publication {
                    title: safe_truncate_chars(&text, MAX_PDF_TITLE_CHARS).to_string(),
                    year: year_in(&text),
                    url: url.map(|u| u.to_string()),
                    full_text: text,
                    ..Default::default()
                })
            })
            .collect())
    }
}

/// The stock publication extractor, capped at the default limit.
#[must_use]
pub fn extractor() -> Extractor<Publication> {
    Extractor::new(vec![
        Box::new(PublicationContainerStrategy::default()),
        Box::new(PublicationTextStrategy),
        Box::new(PublicationPdfStrategy),
    ])
    .with_max_records(DEFAULT_PUBLICATIONS_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn run<S: Strategy<Publication>>(strategy: &S, html: &str) -> Vec<Publication> {
        let base = Url::parse("https://inst.example.org/").unwrap();
        let page = Url::parse("https://inst.example.org/en/publications").unwrap();
        let ctx = PageContext {
            base_url: &base,
            page_url: &page,
        };
        strategy.attempt(&Html::parse_document(html), &ctx).unwrap()
    }

    #[test]
    fn quoted_citation_is_split() {
        let p = parse_citation(
            r#"A. Pérez, L. Gómez, "A low-power sigma-delta modulator", IEEE JSSC, vol. 58, 2023. doi:10.1109/JSSC.2023.123"#,
        );
        assert_eq!(p.authors, "A. Pérez, L. Gómez");
        assert_eq!(p.title, "A low-power sigma-delta modulator");
        assert_eq!(p.venue, "IEEE JSSC, vol. 58");
        assert_eq!(p.year, Some(2023));
        assert_eq!(p.doi.as_deref(), Some("10.1109/JSSC.2023.123"));
    }

    #[test]
    fn unquoted_citation_keeps_full_text() {
        let p = parse_citation("Some free-form reference without quotes, 2019");
        assert!(p.title.is_empty());
        assert_eq!(p.year, Some(2019));
        assert_eq!(p.full_text, "Some free-form reference without quotes, 2019");
    }

    #[test]
    fn container_reads_links() {
        let html = r#"<ul>
            <li class="publication-item">M. Ruiz, "Radiation-hardened SRAM cells", TNS, 2021 <a href="/pdf/sram.pdf">pdf</a></li>
        </ul>"#;
        let pubs = run(&PublicationContainerStrategy::default(), html);
        assert_eq!(pubs.len(), 1);
        assert_eq!(pubs[0].title, "Radiation-hardened SRAM cells");
        assert_eq!(pubs[0].url.as_deref(), Some("https://inst.example.org/pdf/sram.pdf"));
    }

    #[test]
    fn author_year_lines_are_recognised() {
        let html = "<main><p>Pérez, A. and Gómez, L. (2020). Design of CMOS image sensors. Sensors Journal</p></main>";
        let pubs = run(&PublicationTextStrategy, html);
        let p = pubs
            .iter()
            .find(|p| p.title == "Design of CMOS image sensors")
            .unwrap();
        assert_eq!(p.year, Some(2020));
        assert_eq!(p.venue, "Sensors Journal");
    }

    #[test]
    fn short_pdf_links_are_ignored() {
        let html = r#"<a href="a.pdf">PDF</a><a href="b.pdf">Annual report on mixed-signal design 2022</a>"#;
        let pubs = run(&PublicationPdfStrategy, html);
        assert_eq!(pubs.len(), 1);
        assert_eq!(pubs[0].year, Some(2022));
        assert_eq!(pubs[0].url.as_deref(), Some("https://inst.example.org/en/b.pdf"));
    }
}
