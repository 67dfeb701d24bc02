//! Contact strategies.
//!
//! Every strategy emits partial [`ContactInfo`] values; they all share the
//! singleton identity and are folded into one record by the merger.
//!
//! 1. `block`: contact/address/footer blocks read with labelled patterns.
//! 2. `social`: social network links anywhere on the page.
//! 3. `text` (fallback): the same patterns over the main content area.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::document::{attr, content_root, first_mailto, lines_of};
use super::errors::StructuralParseError;
use super::extractor::Extractor;
use super::strategy::{Strategy, Trigger};
use crate::records::{ContactInfo, PageContext};

static BLOCK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".contact, .address, .contact-info, footer, .footer, #footer")
        .expect("BUG: hardcoded CSS selector for contact blocks is invalid")
});

static SOCIAL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        r#"a[href*="twitter"], a[href*="://x.com"], a[href*="facebook"], a[href*="linkedin"], a[href*="youtube"], a[href*="instagram"]"#,
    )
    .expect("BUG: hardcoded CSS selector for social links is invalid")
});

static ADDRESS_LABELLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:address|direcci[oó]n)\s*:?\s*([^,\n]+(?:,[^,\n]+){0,3})")
        .expect("BUG: hardcoded labelled address regex is invalid")
});

static ADDRESS_STREET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:C/|Calle|Avda\.?|Avenida|Ave\.?|Avenue|Street)[^\n]*?\d+[^\d\n,]*")
        .expect("BUG: hardcoded street address regex is invalid")
});

static POSTAL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{5})\b").expect("BUG: hardcoded postal code regex is invalid")
});

static CITY_KNOWN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(Seville|Sevilla)\b").expect("BUG: hardcoded city regex is invalid")
});

static CITY_BEFORE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r",\s*(\p{Lu}\p{Ll}+(?:\s+\p{Lu}\p{Ll}+)?)\s*\d{5}")
        .expect("BUG: hardcoded city-before-code regex is invalid")
});

static CITY_AFTER_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{5}\s+(\p{Lu}\p{Ll}+(?:\s+\p{Lu}\p{Ll}+)?)")
        .expect("BUG: hardcoded city-after-code regex is invalid")
});

static CITY_IN_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r",\s*(\p{Lu}\p{Ll}+(?:\s+\p{Lu}\p{Ll}+)?)")
        .expect("BUG: hardcoded city-in-address regex is invalid")
});

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Telephone|Phone|Tel[eé]fono|Tel|Tlf)\.?:?\s*(\+?[\d\s().-]{7,})")
        .expect("BUG: hardcoded phone regex is invalid")
});

static FAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Fax\.?:?\s*(\+?[\d\s().-]{7,})").expect("BUG: hardcoded fax regex is invalid")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+").expect("BUG: hardcoded email regex is invalid")
});

const SOCIAL_PLATFORMS: &[(&str, &[&str])] = &[
    ("twitter", &["twitter.com", "://x.com"]),
    ("facebook", &["facebook.com"]),
    ("linkedin", &["linkedin.com"]),
    ("youtube", &["youtube.com", "youtu.be"]),
    ("instagram", &["instagram.com"]),
];

fn platform_of(href: &str) -> Option<&'static str> {
    let lower = href.to_ascii_lowercase();
    SOCIAL_PLATFORMS
        .iter()
        .find(|(_, hosts)| hosts.iter().any(|h| lower.contains(h)))
        .map(|(platform, _)| *platform)
}

/// Social links under `root`, first link per platform.
fn social_links(root: ElementRef<'_>) -> BTreeMap<String, String> {
    let mut links = BTreeMap::new();
    for href in root.select(&SOCIAL_SELECTOR).filter_map(|a| attr(a, "href")) {
        if let Some(platform) = platform_of(href) {
            links
                .entry(platform.to_string())
                .or_insert_with(|| href.to_string());
        }
    }
    links
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Read labelled contact fields from a block of text.
///
/// The city falls back to the first capitalised token after a comma in
/// the address.
pub fn parse_contact_text(text: &str) -> ContactInfo {
    let address = capture(&ADDRESS_LABELLED, text)
        .or_else(|| ADDRESS_STREET.find(text).map(|m| m.as_str().trim().to_string()));
    let city = capture(&CITY_KNOWN, text)
        .or_else(|| capture(&CITY_BEFORE_CODE, text))
        .or_else(|| capture(&CITY_AFTER_CODE, text))
        .or_else(|| {
            address
                .as_deref()
                .and_then(|a| capture(&CITY_IN_ADDRESS, a))
        });
    ContactInfo {
        city,
        postal_code: capture(&POSTAL_CODE, text),
        phone: capture(&PHONE, text),
        fax: capture(&FAX, text),
        email: EMAIL.find(text).map(|m| m.as_str().to_string()),
        address,
        ..Default::default()
    }
}

/// Contact and footer blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactBlockStrategy;

impl Strategy<ContactInfo> for ContactBlockStrategy {
    fn name(&self) -> &'static str {
        "block"
    }

    fn attempt(&self, doc: &Html, _ctx: &PageContext<'_>) -> Result<Vec<ContactInfo>, StructuralParseError> {
        Ok(doc
            .select(&BLOCK_SELECTOR)
            .map(|block| {
                let mut info = parse_contact_text(&lines_of(block));
                if let Some(mail) = first_mailto(block) {
                    info.email = Some(mail);
                }
                info.social_media = social_links(block);
                info
            })
            .collect())
    }
}

/// Page-wide social network links.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactSocialStrategy;

impl Strategy<ContactInfo> for ContactSocialStrategy {
    fn name(&self) -> &'static str {
        "social"
    }

    fn attempt(&self, doc: &Html, _ctx: &PageContext<'_>) -> Result<Vec<ContactInfo>, StructuralParseError> {
        let social_media = social_links(doc.root_element());
        if social_media.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![ContactInfo {
            social_media,
            ..Default::default()
        }])
    }
}

/// Labelled fields anywhere in the main content.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactTextStrategy;

impl Strategy<ContactInfo> for ContactTextStrategy {
    fn name(&self) -> &'static str {
        "text"
    }

    fn trigger(&self) -> Trigger {
        Trigger::BelowYield
    }

    fn attempt(&self, doc: &Html, _ctx: &PageContext<'_>) -> Result<Vec<ContactInfo>, StructuralParseError> {
        Ok(vec![parse_contact_text(&lines_of(content_root(doc)))])
    }
}

/// The stock contact extractor.
#[must_use]
pub fn extractor() -> Extractor<ContactInfo> {
    Extractor::new(vec![
        Box::new(ContactBlockStrategy),
        Box::new(ContactSocialStrategy),
        Box::new(ContactTextStrategy),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn run<S: Strategy<ContactInfo>>(strategy: &S, html: &str) -> Vec<ContactInfo> {
        let base = Url::parse("https://inst.example.org/").unwrap();
        let ctx = PageContext {
            base_url: &base,
            page_url: &base,
        };
        strategy.attempt(&Html::parse_document(html), &ctx).unwrap()
    }

    #[test]
    fn labelled_block_fields() {
        let text = "Address: Av. Américo Vespucio 28, Isla de la Cartuja, 41092 Sevilla\n\
                    Phone: +34 954 466 666\nFax: +34 954 466 600\ninfo@inst.example.org";
        let info = parse_contact_text(text);
        assert_eq!(
            info.address.as_deref(),
            Some("Av. Américo Vespucio 28, Isla de la Cartuja, 41092 Sevilla")
        );
        assert_eq!(info.postal_code.as_deref(), Some("41092"));
        assert_eq!(info.city.as_deref(), Some("Sevilla"));
        assert_eq!(info.phone.as_deref(), Some("+34 954 466 666"));
        assert_eq!(info.fax.as_deref(), Some("+34 954 466 600"));
        assert_eq!(info.email.as_deref(), Some("info@inst.example.org"));
    }

    #[test]
    fn city_falls_back_to_address_token() {
        let info = parse_contact_text("Address: Calle Mayor 3, Madrid");
        assert_eq!(info.city.as_deref(), Some("Madrid"));
    }

    #[test]
    fn footer_block_prefers_mailto_and_reads_social() {
        let html = r#"<footer>
            <p>Tel. 954 466 666</p>
            <a href="mailto:contact@inst.example.org">Write to us</a>
            <a href="https://twitter.com/inst">tw</a>
            <a href="https://www.linkedin.com/company/inst">in</a>
        </footer>"#;
        let infos = run(&ContactBlockStrategy, html);
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].email.as_deref(), Some("contact@inst.example.org"));
        assert_eq!(infos[0].social_media.len(), 2);
        assert_eq!(
            infos[0].social_media.get("twitter").map(String::as_str),
            Some("https://twitter.com/inst")
        );
    }

    #[test]
    fn page_without_social_links_yields_nothing() {
        assert!(run(&ContactSocialStrategy, "<p>hello</p>").is_empty());
    }
}
