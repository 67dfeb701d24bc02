//! Small helpers over `scraper` shared by the strategies.

use std::sync::LazyLock;

use ego_tree::iter::Edge;
use html_escape::decode_html_entities;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

use super::errors::{ParseError, StructuralParseError};
use crate::normalizer::collapse_whitespace;
use crate::utils::MAX_HTML_SIZE;

static CONTENT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".item-page, .content, #content, main, article")
        .expect("BUG: hardcoded CSS selector for content areas is invalid")
});

static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("body").expect("BUG: hardcoded CSS selector 'body' is invalid")
});

pub(crate) static MAILTO_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a[href^="mailto:"], a[href^="MAILTO:"]"#)
        .expect("BUG: hardcoded CSS selector for mailto links is invalid")
});

pub(crate) static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("BUG: hardcoded CSS selector 'a[href]' is invalid")
});

pub(crate) static IMAGE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("img[src]").expect("BUG: hardcoded CSS selector 'img[src]' is invalid")
});

/// Reject input that cannot be HTML before handing it to html5ever.
///
/// html5ever recovers from any byte sequence, so "malformed beyond
/// recovery" means: empty, binary, oversized, or without a single tag.
pub fn check_document(html: &str) -> Result<(), ParseError> {
    if html.len() > MAX_HTML_SIZE {
        return Err(ParseError::TooLarge {
            size: html.len(),
            limit: MAX_HTML_SIZE,
        });
    }
    if html.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    if html.contains('\0') {
        return Err(ParseError::Binary);
    }
    if !html.contains('<') {
        return Err(ParseError::NotHtml);
    }
    Ok(())
}

/// Validate then parse.
pub fn parse_document(html: &str) -> Result<Html, ParseError> {
    check_document(html)?;
    Ok(Html::parse_document(html))
}

/// Compile a selector supplied at runtime.
pub fn parse_selector(selector: &str) -> Result<Selector, StructuralParseError> {
    Selector::parse(selector).map_err(|e| StructuralParseError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Elements whose text never renders.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

fn is_hidden(node: &Node) -> bool {
    matches!(node, Node::Element(e) if HIDDEN_ELEMENTS.contains(&e.name()))
}

/// Text nodes under `el` in document order, skipping script and style
/// content.
fn visible_text(el: ElementRef<'_>) -> Vec<&str> {
    let mut out = Vec::new();
    let mut hidden_depth = 0usize;
    for edge in el.traverse() {
        match edge {
            Edge::Open(node) if is_hidden(node.value()) => hidden_depth += 1,
            Edge::Close(node) if is_hidden(node.value()) => {
                hidden_depth = hidden_depth.saturating_sub(1);
            }
            Edge::Open(node) if hidden_depth == 0 => {
                if let Node::Text(text) = node.value() {
                    out.push(&**text);
                }
            }
            _ => {}
        }
    }
    out
}

/// Visible text of an element, whitespace collapsed.
///
/// Entities left over from double-escaping CMS editors are decoded.
pub fn text_of(el: ElementRef<'_>) -> String {
    collapse_whitespace(&decode_html_entities(&visible_text(el).join(" ")))
}

/// Text of an element with text nodes kept on separate lines.
///
/// Used by the free-text strategies, whose patterns rely on line breaks.
pub fn lines_of(el: ElementRef<'_>) -> String {
    visible_text(el)
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| decode_html_entities(t).into_owned())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of the first descendant matching `selector`.
pub fn first_text(el: ElementRef<'_>, selector: &Selector) -> Option<String> {
    el.select(selector)
        .map(text_of)
        .find(|t| !t.is_empty())
}

pub fn attr<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name).map(str::trim).filter(|v| !v.is_empty())
}

/// `href` of the first link under `el` (or `el` itself), resolved.
pub fn first_link(el: ElementRef<'_>, page_url: &Url) -> Option<String> {
    let own = (el.value().name() == "a")
        .then(|| attr(el, "href"))
        .flatten();
    own.into_iter()
        .chain(el.select(&LINK_SELECTOR).filter_map(|a| attr(a, "href")))
        .find_map(|href| crate::utils::resolve_link(page_url, href))
        .map(|u| u.to_string())
}

pub fn first_image(el: ElementRef<'_>, page_url: &Url) -> Option<String> {
    el.select(&IMAGE_SELECTOR)
        .filter_map(|img| attr(img, "src"))
        .find(|src| !src.starts_with("data:"))
        .and_then(|src| page_url.join(src).ok())
        .map(|u| u.to_string())
}

/// Address of the first `mailto:` link under `el`.
pub fn first_mailto(el: ElementRef<'_>) -> Option<String> {
    el.select(&MAILTO_SELECTOR)
        .filter_map(|a| attr(a, "href"))
        .map(|href| href[7..].split('?').next().unwrap_or_default().to_string())
        .find(|addr| !addr.is_empty())
}

/// Main content element, falling back to `<body>` and then the root.
pub fn content_root(doc: &Html) -> ElementRef<'_> {
    doc.select(&CONTENT_SELECTOR)
        .next()
        .or_else(|| doc.select(&BODY_SELECTOR).next())
        .unwrap_or_else(|| doc.root_element())
}

/// Following element siblings in document order.
pub fn next_elements<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.next_siblings().filter_map(ElementRef::wrap)
}

/// Heading level for `h1`..`h6`.
pub fn heading_level(el: ElementRef<'_>) -> Option<u8> {
    match el.value().name() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_document_rejects_non_html() {
        assert_eq!(check_document(""), Err(ParseError::Empty));
        assert_eq!(check_document(" \n\t"), Err(ParseError::Empty));
        assert_eq!(check_document("plain text only"), Err(ParseError::NotHtml));
        assert_eq!(check_document("<p>a\0b</p>"), Err(ParseError::Binary));
        assert!(check_document("<p>ok</p>").is_ok());
    }

    #[test]
    fn content_root_prefers_content_area() {
        let doc = Html::parse_document(
            "<html><body><nav>Menu</nav><div id='content'><p>Body text</p></div></body></html>",
        );
        assert_eq!(text_of(content_root(&doc)), "Body text");

        let bare = Html::parse_document("<html><body><p>Only body</p></body></html>");
        assert_eq!(text_of(content_root(&bare)), "Only body");
    }

    #[test]
    fn invalid_runtime_selector_is_structural() {
        let err = parse_selector("div[").unwrap_err();
        assert!(matches!(err, StructuralParseError::InvalidSelector { .. }));
    }

    #[test]
    fn script_text_is_not_visible() {
        let doc = Html::parse_document(
            "<div id=\"x\"><p>Open &amp;amp; day</p><script>var x = 1;</script><style>p{}</style><p>now</p></div>",
        );
        let div = doc.select(&Selector::parse("#x").unwrap()).next().unwrap();
        assert_eq!(text_of(div), "Open & day now");
        assert_eq!(lines_of(div), "Open & day\nnow");
    }

    #[test]
    fn mailto_strips_query() {
        let doc = Html::parse_fragment(r#"<p><a href="mailto:ana@example.org?subject=hi">Ana</a></p>"#);
        assert_eq!(
            first_mailto(doc.root_element()).as_deref(),
            Some("ana@example.org")
        );
    }
}
