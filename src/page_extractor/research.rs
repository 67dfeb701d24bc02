//! Research group strategies.
//!
//! 1. `container`: `div.item`, `article` and `section` blocks in the content
//!    area with a heading, paragraphs and a member list.
//! 2. `heading`: `h2`-`h4` headings followed by paragraphs and list items.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::document::{content_root, heading_level, next_elements, text_of};
use super::errors::StructuralParseError;
use super::extractor::Extractor;
use super::strategy::Strategy;
use crate::records::{PageContext, ResearchGroup};

static BLOCK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.item, article, section")
        .expect("BUG: hardcoded CSS selector for research blocks is invalid")
});

static NAME_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h2, h3, h4, .title")
        .expect("BUG: hardcoded CSS selector for group names is invalid")
});

static PARAGRAPH_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p").expect("BUG: hardcoded CSS selector 'p' is invalid")
});

static MEMBER_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("ul li, .researchers li, .members li")
        .expect("BUG: hardcoded CSS selector for group members is invalid")
});

static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h2, h3, h4").expect("BUG: hardcoded CSS selector 'h2, h3, h4' is invalid")
});

static ITEM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("li").expect("BUG: hardcoded CSS selector 'li' is invalid")
});

/// `Researchers: A, B and C` inside a paragraph.
static MEMBER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:researchers|members|investigadores|miembros)\s*:\s*(.+)$")
        .expect("BUG: hardcoded member label regex is invalid")
});

static MEMBER_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*(?:,|;|\band\b|\by\b)\s*").expect("BUG: hardcoded member split regex is invalid")
});

const MIN_HEADING_CHARS: usize = 10;
const SKIPPED_HEADING_PREFIXES: &[&str] = &["index", "table", "índice", "indice"];

fn labelled_members(paragraph: &str) -> Option<Vec<String>> {
    let caps = MEMBER_LABEL.captures(paragraph)?;
    Some(
        MEMBER_SPLIT
            .split(&caps[1])
            .map(|s| s.trim().trim_end_matches('.').to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

/// Paragraph texts become the description, except a labelled member line.
fn absorb_paragraph(text: String, description: &mut Vec<String>, researchers: &mut Vec<String>) {
    match labelled_members(&text) {
        Some(members) => researchers.extend(members),
        None if !text.is_empty() => description.push(text),
        None => {}
    }
}

/// Self-contained group blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResearchContainerStrategy;

impl ResearchContainerStrategy {
    fn read_block(block: ElementRef<'_>) -> Option<ResearchGroup> {
        let name = block
            .select(&NAME_SELECTOR)
            .map(text_of)
            .find(|t| !t.is_empty())?;
        let mut description = Vec::new();
        let mut researchers: Vec<String> = Vec::new();
        for p in block.select(&PARAGRAPH_SELECTOR) {
            absorb_paragraph(text_of(p), &mut description, &mut researchers);
        }
        researchers.extend(
            block
                .select(&MEMBER_SELECTOR)
                .map(text_of)
                .filter(|t| !t.is_empty()),
        );
        if description.is_empty() && researchers.is_empty() {
            return None;
        }
        Some(ResearchGroup {
            name,
            description: description.join(" "),
            researchers,
            researchers_text: String::new(),
        })
    }
}

impl Strategy<ResearchGroup> for ResearchContainerStrategy {
    fn name(&self) -> &'static str {
        "container"
    }

    fn attempt(&self, doc: &Html, _ctx: &PageContext<'_>) -> Result<Vec<ResearchGroup>, StructuralParseError> {
        Ok(content_root(doc)
            .select(&BLOCK_SELECTOR)
            // Nested blocks would repeat their parent's group.
            .filter(|b| b.select(&BLOCK_SELECTOR).next().is_none())
            .filter_map(ResearchContainerStrategy::read_block)
            .collect())
    }
}

/// A heading followed by its description and member list.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResearchHeadingStrategy;

impl ResearchHeadingStrategy {
    fn read_block(heading: ElementRef<'_>) -> Option<ResearchGroup> {
        let name = text_of(heading);
        let lower = name.to_lowercase();
        if name.chars().count() <= MIN_HEADING_CHARS
            || SKIPPED_HEADING_PREFIXES.iter().any(|p| lower.starts_with(p))
        {
            return None;
        }
        let mut description = Vec::new();
        let mut researchers = Vec::new();
        for sibling in next_elements(heading) {
            if heading_level(sibling).is_some() {
                break;
            }
            match sibling.value().name() {
                "p" => absorb_paragraph(text_of(sibling), &mut description, &mut researchers),
                "ul" | "ol" => researchers.extend(
                    sibling
                        .select(&ITEM_SELECTOR)
                        .map(text_of)
                        .filter(|t| !t.is_empty()),
                ),
                _ => {}
            }
        }
        if description.is_empty() && researchers.is_empty() {
            return None;
        }
        Some(ResearchGroup {
            name,
            description: description.join(" "),
            researchers,
            researchers_text: String::new(),
        })
    }
}

impl Strategy<ResearchGroup> for ResearchHeadingStrategy {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn attempt(&self, doc: &Html, _ctx: &PageContext<'_>) -> Result<Vec<ResearchGroup>, StructuralParseError> {
        Ok(content_root(doc)
            .select(&HEADING_SELECTOR)
            .filter_map(ResearchHeadingStrategy::read_block)
            .collect())
    }
}

/// The stock research group extractor.
#[must_use]
pub fn extractor() -> Extractor<ResearchGroup> {
    Extractor::new(vec![
        Box::new(ResearchContainerStrategy),
        Box::new(ResearchHeadingStrategy),
    ])
}
