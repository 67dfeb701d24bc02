//! Test utilities and helper functions for the institute_scrape test suite

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use institute_scrape::utils::normalize_url_key;
use institute_scrape::{FetchError, FetchResult, PageFetcher};

/// Base URL shared by every fixture site.
#[allow(dead_code)]
pub const BASE: &str = "https://inst.example.org/";

/// In-memory fetcher serving fixture pages, with per-URL call counters.
///
/// Unknown URLs answer 404.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, String>,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    delay: Option<Duration>,
}

#[allow(dead_code)]
impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` at `url` (relative URLs resolve against [`BASE`]).
    pub fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(key(url), html.into());
        self
    }

    /// Sleep before answering, so concurrent requests overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fetches issued for `url`.
    pub fn calls(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&key(url))
            .copied()
            .unwrap_or(0)
    }

    /// Fetches issued for any URL.
    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Most fetches observed running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Every URL fetched at least once.
    pub fn fetched_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.calls.lock().unwrap().keys().cloned().collect();
        urls.sort();
        urls
    }
}

impl PageFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str, render_js: bool) -> Result<FetchResult, FetchError> {
        let key = key(url);
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.calls.lock().unwrap().entry(key.clone()).or_insert(0) += 1;
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match self.pages.get(&key) {
            Some(html) => Ok(FetchResult::new(key, html.clone()).rendered(render_js)),
            None => Err(FetchError::HttpStatus {
                url: key,
                status: 404,
            }),
        }
    }

    fn renders_js(&self) -> bool {
        true
    }
}

/// Absolute, normalised form of a fixture URL.
#[allow(dead_code)]
pub fn key(url: &str) -> String {
    let absolute = if url.starts_with("http") {
        url.to_string()
    } else {
        format!("{BASE}{}", url.trim_start_matches('/'))
    };
    normalize_url_key(&absolute).unwrap()
}

/// Creates a test HTML document with specified content
#[allow(dead_code)]
pub fn create_test_html(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{}</title>
</head>
<body>
    {}
</body>
</html>"#,
        html_escape::encode_text(title),
        body
    )
}

/// A `<nav>` menu linking `(title, href)` pairs.
#[allow(dead_code)]
pub fn nav_menu(links: &[(&str, &str)]) -> String {
    let items: String = links
        .iter()
        .map(|(title, href)| {
            format!(
                r#"<li><a href="{}">{}</a></li>"#,
                html_escape::encode_double_quoted_attribute(href),
                html_escape::encode_text(title)
            )
        })
        .collect();
    format!("<nav><ul>{items}</ul></nav>")
}

/// A `<main>` block of plain content links.
#[allow(dead_code)]
pub fn content_links(links: &[(&str, &str)]) -> String {
    let anchors: String = links
        .iter()
        .map(|(title, href)| {
            format!(
                r#"<p><a href="{}">{}</a></p>"#,
                html_escape::encode_double_quoted_attribute(href),
                html_escape::encode_text(title)
            )
        })
        .collect();
    format!("<main>{anchors}</main>")
}

/// A staff table with a `Name | Email | Phone` header.
#[allow(dead_code)]
pub fn staff_table(rows: &[(&str, &str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(name, email, phone)| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                html_escape::encode_text(name),
                html_escape::encode_text(email),
                html_escape::encode_text(phone)
            )
        })
        .collect();
    format!("<table><tr><th>Name</th><th>Email</th><th>Phone</th></tr>{body}</table>")
}
