//! Section strategies over the home page.
//!
//! 1. `menu`: anchors under the first known menu selector that matches.
//! 2. `link_density` (fallback): the list or nav element holding the most
//!    same-site links.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::document::{attr, parse_selector, text_of, LINK_SELECTOR};
use super::errors::StructuralParseError;
use super::extractor::Extractor;
use super::strategy::{Strategy, Trigger};
use crate::records::{PageContext, Section};
use crate::utils::{resolve_link, same_site};

const MENU_SELECTORS: &[&str] = &["ul.menu li a", "nav ul li a", ".nav-menu a", "#main-menu a"];

static MENUS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    MENU_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("BUG: hardcoded CSS selector for menus is invalid"))
        .collect()
});

static LINK_GROUP_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("nav, ul, ol").expect("BUG: hardcoded CSS selector for link groups is invalid")
});

/// A link group needs this many same-site links to count as navigation.
const MIN_DENSE_LINKS: usize = 3;

fn section_from_anchor(anchor: ElementRef<'_>, ctx: &PageContext<'_>) -> Option<Section> {
    let href = attr(anchor, "href")?;
    let url = resolve_link(ctx.page_url, href)?;
    if !same_site(&url, ctx.base_url) {
        return None;
    }
    let title = text_of(anchor);
    if title.is_empty() {
        return None;
    }
    Some(Section::new(title, url.to_string()))
}

fn sections_under(root: ElementRef<'_>, ctx: &PageContext<'_>) -> Vec<Section> {
    root.select(&LINK_SELECTOR)
        .filter_map(|a| section_from_anchor(a, ctx))
        .collect()
}

/// Known menu markup.
#[derive(Debug, Clone)]
pub struct MenuStrategy {
    menus: Vec<Selector>,
}

impl Default for MenuStrategy {
    fn default() -> Self {
        Self {
            menus: MENUS.clone(),
        }
    }
}

impl MenuStrategy {
    /// Try `selectors` in order instead of the built-in menu selectors.
    pub fn with_selectors(selectors: &[&str]) -> Result<Self, StructuralParseError> {
        Ok(Self {
            menus: selectors
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl Strategy<Section> for MenuStrategy {
    fn name(&self) -> &'static str {
        "menu"
    }

    fn attempt(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<Vec<Section>, StructuralParseError> {
        for menu in &self.menus {
            let found: Vec<Section> = doc
                .select(menu)
                .filter_map(|a| section_from_anchor(a, ctx))
                .collect();
            if !found.is_empty() {
                return Ok(found);
            }
        }
        Ok(Vec::new())
    }
}

/// Densest same-site link group on the page.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkDensityStrategy;

impl Strategy<Section> for LinkDensityStrategy {
    fn name(&self) -> &'static str {
        "link_density"
    }

    fn trigger(&self) -> Trigger {
        Trigger::BelowYield
    }

    fn attempt(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<Vec<Section>, StructuralParseError> {
        // Ties keep the first group in document order.
        let best = doc
            .select(&LINK_GROUP_SELECTOR)
            .map(|group| sections_under(group, ctx))
            .filter(|links| links.len() >= MIN_DENSE_LINKS)
            .fold(None::<Vec<Section>>, |best, links| match best {
                Some(b) if b.len() >= links.len() => Some(b),
                _ => Some(links),
            });
        Ok(best.unwrap_or_default())
    }
}

/// The stock section extractor.
#[must_use]
pub fn extractor() -> Extractor<Section> {
    Extractor::new(vec![Box::new(MenuStrategy::default()), Box::new(LinkDensityStrategy)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn run<S: Strategy<Section>>(strategy: &S, html: &str) -> Vec<Section> {
        let base = Url::parse("https://inst.example.org/").unwrap();
        let ctx = PageContext {
            base_url: &base,
            page_url: &base,
        };
        strategy.attempt(&Html::parse_document(html), &ctx).unwrap()
    }

    #[test]
    fn first_matching_menu_wins_and_external_links_drop() {
        let html = r#"<nav><ul>
            <li><a href="/index.php/en/news">News</a></li>
            <li><a href="https://www.inst.example.org/index.php/en/people">People</a></li>
            <li><a href="https://twitter.com/inst">Twitter</a></li>
        </ul></nav>"#;
        let sections = run(&MenuStrategy::default(), html);
        let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["News", "People"]);
        assert_eq!(sections[0].section_id, "news");
        assert_eq!(sections[0].url, "https://inst.example.org/index.php/en/news");
    }

    #[test]
    fn dense_list_is_used_without_menu_markup() {
        let html = r#"<div>
            <ul><li><a href="/a">A page</a></li></ul>
            <ul>
              <li><a href="/research">Research</a></li>
              <li><a href="/projects">Projects</a></li>
              <li><a href="/contact">Contact</a></li>
            </ul>
        </div>"#;
        assert!(run(&MenuStrategy::default(), html).is_empty());
        let sections = run(&LinkDensityStrategy, html);
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[2].title, "Contact");
    }
}
