//! `HttpFetcher` against a local mock server.

use std::time::Duration;

use institute_scrape::{FetchError, HttpFetcher, PageFetcher};
use mockito::Server;

mod common;

use common::create_test_html;

fn fetcher(max_retries: u8) -> HttpFetcher {
    HttpFetcher::new(Duration::from_secs(5), max_retries, "institute-scrape-test")
        .unwrap()
        .with_retry_backoff(Duration::from_millis(5))
}

#[tokio::test]
async fn test_fetch_returns_body() {
    let mut server = Server::new_async().await;
    let html = create_test_html("People", "<p>Ana Pérez</p>");
    let mock = server
        .mock("GET", "/en/people")
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(&html)
        .create_async()
        .await;

    let url = format!("{}/en/people", server.url());
    let page = fetcher(2).fetch(&url, false).await.unwrap();

    mock.assert_async().await;
    assert_eq!(page.url, url);
    assert!(page.html.contains("Ana Pérez"));
    assert!(!page.rendered);
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/busy")
        .with_status(503)
        .with_body("Service Unavailable")
        .expect(3)
        .create_async()
        .await;

    let url = format!("{}/busy", server.url());
    let err = fetcher(2).fetch(&url, false).await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, FetchError::HttpStatus { status: 503, .. }));
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .with_body("Not Found")
        .expect(1)
        .create_async()
        .await;

    let url = format!("{}/missing", server.url());
    let err = fetcher(3).fetch(&url, false).await.unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.url(), Some(url.as_str()));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_render_request_is_served_statically() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/")
        .with_status(200)
        .with_body(create_test_html("Home", "<p>home</p>"))
        .create_async()
        .await;

    let page = fetcher(0)
        .fetch(&format!("{}/", server.url()), true)
        .await
        .unwrap();

    assert!(!page.rendered);
}

#[tokio::test]
async fn test_non_http_scheme_is_invalid() {
    let err = fetcher(0)
        .fetch("ftp://inst.example.org/file", false)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl { .. }));
}
