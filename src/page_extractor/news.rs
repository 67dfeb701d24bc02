//! News strategies.
//!
//! 1. `container`: items inside a blog/news container.
//! 2. `heading`: a heading followed by paragraph siblings.
//! 3. `text` (fallback): title / date / body patterns in the page text.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::document::{
    content_root, first_image, first_link, first_text, heading_level, lines_of, next_elements,
    parse_selector, text_of,
};
use super::errors::StructuralParseError;
use super::extractor::Extractor;
use super::strategy::{Strategy, Trigger};
use crate::normalizer::extract_date_from_text;
use crate::records::{NewsItem, PageContext};

static CONTAINER_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".blog, .news-container, #content, .item-page")
        .expect("BUG: hardcoded CSS selector for news containers is invalid")
});

static ITEM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"article, .item, div[class*="blog-item"], div[class*="news-item"]"#)
        .expect("BUG: hardcoded CSS selector for news items is invalid")
});

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h2, h3, .title, .item-title")
        .expect("BUG: hardcoded CSS selector for news titles is invalid")
});

static DATE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".date, .datetime, time, .item-date")
        .expect("BUG: hardcoded CSS selector for news dates is invalid")
});

static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".content, .item-content, .text, p")
        .expect("BUG: hardcoded CSS selector for news bodies is invalid")
});

static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h2, h3").expect("BUG: hardcoded CSS selector 'h2, h3' is invalid")
});

static NEWS_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([A-Z][^.\n]{10,100})\.?[ \t]*\n(?:[ \t]*(\d{1,2}\s+[A-Z][a-z]+\s+\d{4})[ \t]*\n)?[ \t]*([^\n]{50,})",
    )
    .expect("BUG: hardcoded news text regex is invalid")
});

const MIN_HEADING_CHARS: usize = 5;

/// Items under the first news container (`.blog`, `.news-container`,
/// `#content`, `.item-page`).
#[derive(Debug, Clone)]
pub struct NewsContainerStrategy {
    container: Selector,
    item: Selector,
}

impl Default for NewsContainerStrategy {
    fn default() -> Self {
        Self {
            container: CONTAINER_SELECTOR.clone(),
            item: ITEM_SELECTOR.clone(),
        }
    }
}

impl NewsContainerStrategy {
    /// Use site-specific container and item selectors.
    pub fn with_selectors(container: &str, item: &str) -> Result<Self, StructuralParseError> {
        Ok(Self {
            container: parse_selector(container)?,
            item: parse_selector(item)?,
        })
    }

    fn read_item(item: ElementRef<'_>, ctx: &PageContext<'_>) -> Option<NewsItem> {
        let title_el = item.select(&TITLE_SELECTOR).next()?;
        let title = text_of(title_el);
        if title.is_empty() {
            return None;
        }
        let full_text = text_of(item);
        let date_text =
            first_text(item, &DATE_SELECTOR).or_else(|| extract_date_from_text(&full_text));
        let content = first_text(item, &BODY_SELECTOR).unwrap_or_else(|| {
            full_text
                .replacen(&title, "", 1)
                .trim()
                .to_string()
        });
        Some(NewsItem {
            title,
            date: None,
            date_text,
            content,
            url: first_link(title_el, ctx.page_url).or_else(|| first_link(item, ctx.page_url)),
            image_url: first_image(item, ctx.page_url),
        })
    }
}

impl Strategy<NewsItem> for NewsContainerStrategy {
    fn name(&self) -> &'static str {
        "container"
    }

    fn attempt(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<Vec<NewsItem>, StructuralParseError> {
        let Some(container) = doc.select(&self.container).next() else {
            return Ok(Vec::new());
        };
        Ok(container
            .select(&self.item)
            .filter_map(|item| Self::read_item(item, ctx))
            .collect())
    }
}

/// `h2`/`h3` headings followed by paragraphs up to the next heading.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewsHeadingStrategy;

impl NewsHeadingStrategy {
    fn read_block(heading: ElementRef<'_>, ctx: &PageContext<'_>) -> Option<NewsItem> {
        let title = text_of(heading);
        if title.chars().count() < MIN_HEADING_CHARS {
            return None;
        }
        let mut date_text = None;
        let mut paragraphs = Vec::new();
        let mut url = first_link(heading, ctx.page_url);
        let mut image_url = None;

        for sibling in next_elements(heading) {
            if heading_level(sibling).is_some()
                || matches!(sibling.value().name(), "article" | "section")
            {
                break;
            }
            let text = text_of(sibling);
            if date_text.is_none()
                && (sibling.value().name() == "time"
                    || sibling.select(&DATE_SELECTOR).next().is_some()
                    || sibling
                        .value()
                        .classes()
                        .any(|c| c.contains("date")))
            {
                date_text = Some(text);
                continue;
            }
            if date_text.is_none()
                && let Some(found) = extract_date_from_text(&text)
                && found.len() + 2 >= text.len()
            {
                date_text = Some(found);
                continue;
            }
            if image_url.is_none() {
                image_url = first_image(sibling, ctx.page_url);
            }
            if url.is_none() {
                url = first_link(sibling, ctx.page_url);
            }
            if !text.is_empty() {
                paragraphs.push(text);
            }
        }

        if paragraphs.is_empty() {
            return None;
        }
        let content = paragraphs.join(" ");
        if date_text.is_none() {
            date_text = extract_date_from_text(&content);
        }
        Some(NewsItem {
            title,
            date: None,
            date_text,
            content,
            url,
            image_url,
        })
    }
}

impl Strategy<NewsItem> for NewsHeadingStrategy {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn attempt(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<Vec<NewsItem>, StructuralParseError> {
        Ok(content_root(doc)
            .select(&HEADING_SELECTOR)
            .filter_map(|h| Self::read_block(h, ctx))
            .collect())
    }
}

/// Free-text fallback: a capitalised title line, an optional
/// `1 March 2024` date, then a long body line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewsTextStrategy;

impl Strategy<NewsItem> for NewsTextStrategy {
    fn name(&self) -> &'static str {
        "text"
    }

    fn trigger(&self) -> Trigger {
        Trigger::BelowYield
    }

    fn attempt(&self, doc: &Html, _ctx: &PageContext<'_>) -> Result<Vec<NewsItem>, StructuralParseError> {
        let text = lines_of(content_root(doc));
        Ok(NEWS_TEXT
            .captures_iter(&text)
            .map(|c| NewsItem {
                title: c[1].trim().to_string(),
                date: None,
                date_text: c.get(2).map(|m| m.as_str().to_string()),
                content: c[3].trim().to_string(),
                url: None,
                image_url: None,
            })
            .collect())
    }
}

/// The stock news extractor.
#[must_use]
pub fn extractor() -> Extractor<NewsItem> {
    Extractor::new(vec![
        Box::new(NewsContainerStrategy::default()),
        Box::new(NewsHeadingStrategy),
        Box::new(NewsTextStrategy),
    ])
}
