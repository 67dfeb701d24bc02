//! Page cache behaviour under concurrent access.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use institute_scrape::{FetchError, PageCache};

mod common;

use common::{BASE, FixtureFetcher, create_test_html};

#[tokio::test]
async fn test_concurrent_requests_share_one_fetch() {
    let fetcher = Arc::new(
        FixtureFetcher::new()
            .page("en/people", create_test_html("People", "<p>Staff</p>"))
            .with_delay(Duration::from_millis(30)),
    );
    let cache = Arc::new(PageCache::new());
    let url = format!("{BASE}en/people");

    let handles = (0..16).map(|i| {
        let fetcher = Arc::clone(&fetcher);
        let cache = Arc::clone(&cache);
        // Vary the spelling; every form normalises to the same key.
        let url = if i % 2 == 0 { url.clone() } else { format!("{url}#staff") };
        tokio::spawn(async move { cache.get_or_fetch(fetcher.as_ref(), &url, false).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(fetcher.total_calls(), 1);
    assert_eq!(cache.len(), 1);
    let first = &results[0];
    assert!(results.iter().all(|r| Arc::ptr_eq(r, first)));
    assert!(first.html.contains("Staff"));
}

#[tokio::test]
async fn test_distinct_urls_fetch_once_each() {
    let fetcher = FixtureFetcher::new()
        .page("a", create_test_html("A", "<p>a</p>"))
        .page("b", create_test_html("B", "<p>b</p>"));
    let cache = PageCache::new();

    for _ in 0..3 {
        for path in ["a", "b"] {
            cache
                .get_or_fetch(&fetcher, &format!("{BASE}{path}"), false)
                .await
                .unwrap();
        }
    }

    assert_eq!(fetcher.calls("a"), 1);
    assert_eq!(fetcher.calls("b"), 1);
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn test_missing_page_error_is_shared() {
    let fetcher = FixtureFetcher::new().with_delay(Duration::from_millis(10));
    let cache = PageCache::new();
    let url = format!("{BASE}nowhere");

    let (a, b) = tokio::join!(
        cache.get_or_fetch(&fetcher, &url, false),
        cache.get_or_fetch(&fetcher, &url, false)
    );

    assert!(matches!(a, Err(FetchError::HttpStatus { status: 404, .. })));
    assert_eq!(a, b);
    assert_eq!(fetcher.total_calls(), 1);
}

#[tokio::test]
async fn test_render_mode_is_part_of_the_key() {
    let fetcher = FixtureFetcher::new().page("", create_test_html("Home", "<p>home</p>"));
    let cache = PageCache::new();

    let rendered = cache.get_or_fetch(&fetcher, BASE, true).await.unwrap();
    let plain = cache.get_or_fetch(&fetcher, BASE, false).await.unwrap();
    let rendered_again = cache.get_or_fetch(&fetcher, BASE, true).await.unwrap();

    assert!(rendered.rendered);
    assert!(!plain.rendered);
    assert!(!Arc::ptr_eq(&rendered, &plain));
    assert!(Arc::ptr_eq(&rendered, &rendered_again));
    assert_eq!(fetcher.total_calls(), 2);
    assert_eq!(cache.len(), 2);
}
