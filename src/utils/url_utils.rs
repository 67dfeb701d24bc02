//! URL manipulation utilities.
//!
//! This module provides the URL helpers shared by the navigator, the page
//! cache and the field normalizer.

use url::Url;

/// Normalize a URL string by stripping fragment anchors.
///
/// Fragment identifiers (#foo) are client-side navigation markers that don't
/// represent different HTTP resources. The result is the key used by the
/// page cache, the visited set and section de-duplication.
///
/// ```
/// # use institute_scrape::utils::url_utils::normalize_url_key;
/// let normalized = normalize_url_key("https://example.com/page#section").unwrap();
/// assert_eq!(normalized, "https://example.com/page");
/// ```
pub fn normalize_url_key(url: &str) -> Result<String, url::ParseError> {
    let mut parsed = Url::parse(url.trim())?;
    parsed.set_fragment(None);
    Ok(parsed.to_string())
}

/// Resolve `href` against `base`, rejecting non-navigational schemes.
///
/// Returns `None` for empty hrefs, pure fragments, `javascript:`, `mailto:`
/// and `tel:` links, and anything that does not resolve to http(s).
#[must_use]
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("mailto:") || lower.starts_with("tel:")
    {
        return None;
    }
    let joined = base.join(href).ok()?;
    matches!(joined.scheme(), "http" | "https").then_some(joined)
}

/// Host without a leading `www.`, lowercased.
#[must_use]
pub fn site_host(url: &Url) -> Option<String> {
    url.host_str()
        .map(|h| h.trim_start_matches("www.").to_ascii_lowercase())
}

/// Whether two URLs belong to the same site (`www.` prefix ignored).
#[must_use]
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (site_host(a), site_host(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Human-readable fallback title from the last path segment.
///
/// ```
/// # use institute_scrape::utils::url_utils::title_from_url;
/// let url = url::Url::parse("https://example.com/research/mixed-signal_design/").unwrap();
/// assert_eq!(title_from_url(&url), "mixed signal design");
/// ```
#[must_use]
pub fn title_from_url(url: &Url) -> String {
    url.path()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .replace(['-', '_'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_link_skips_non_navigational_schemes() {
        let base = Url::parse("https://example.com/a/").unwrap();
        assert!(resolve_link(&base, "#top").is_none());
        assert!(resolve_link(&base, "javascript:void(0)").is_none());
        assert!(resolve_link(&base, "mailto:x@example.com").is_none());
        assert!(resolve_link(&base, "TEL:+34 954").is_none());
        assert_eq!(
            resolve_link(&base, "b?x=1").unwrap().as_str(),
            "https://example.com/a/b?x=1"
        );
    }

    #[test]
    fn same_site_ignores_www_prefix() {
        let a = Url::parse("http://www.example.com/x").unwrap();
        let b = Url::parse("https://example.com/y").unwrap();
        let c = Url::parse("https://other.org/").unwrap();
        assert!(same_site(&a, &b));
        assert!(!same_site(&a, &c));
    }

    #[test]
    fn normalize_url_key_keeps_query() {
        assert_eq!(
            normalize_url_key("https://example.com/p?id=3#frag").unwrap(),
            "https://example.com/p?id=3"
        );
        assert!(normalize_url_key("not a url").is_err());
    }
}
