//! Tests for the type-safe configuration builder pattern

use institute_scrape::config::{ConfigError, DEFAULT_EXCLUDED_PATTERNS, ScrapeConfig};
use institute_scrape::{RecordKind, ScalarConflict};
use tempfile::TempDir;

mod common;

#[test]
fn test_builder_requires_base_url_and_output_dir() {
    // These should not compile if uncommented:
    // let config = ScrapeConfig::builder().build();
    // let config = ScrapeConfig::builder().base_url("https://example.org").build();

    let temp_dir = TempDir::new().unwrap();
    let config = ScrapeConfig::builder()
        .base_url("https://example.org")
        .output_dir(temp_dir.path())
        .build()
        .unwrap();

    assert_eq!(config.output_dir().as_path(), temp_dir.path());
    assert_eq!(config.base_url().as_str(), "https://example.org/");
}

#[test]
fn test_builder_optional_fields_have_defaults() {
    let config = ScrapeConfig::builder()
        .base_url("https://example.org/")
        .output_dir("data")
        .build()
        .unwrap();

    assert!(!config.include_subpages());
    assert_eq!(config.depth(), 1);
    assert!(config.render_js());
    assert!(config.save_json());
    assert!(config.extract_project_content());
    assert_eq!(config.max_concurrent_pages(), 5);
    assert_eq!(config.publications_limit(), 50);
    assert_eq!(config.scalar_conflict(), ScalarConflict::PreferHigherPriority);
    assert_eq!(config.excluded_patterns().len(), DEFAULT_EXCLUDED_PATTERNS.len());
    assert!(config.is_excluded("https://example.org/index.php/login?x=1"));
    assert!(!config.target_urls(RecordKind::News).is_empty());
}

#[test]
fn test_builder_with_all_optional_fields() {
    let config = ScrapeConfig::builder()
        .base_url("https://example.org/")
        .output_dir("out")
        .include_subpages(true)
        .depth(3)
        .use_selenium(false)
        .save_json(false)
        .extract_project_content(false)
        .max_concurrent_pages(8)
        .publications_limit(10)
        .min_strategy_yield(2)
        .scalar_conflict(ScalarConflict::PreferLonger)
        .excluded_patterns(vec!["*/private/*".into()])
        .request_timeout_secs(5)
        .max_retries(0)
        .user_agent("test-agent")
        .institute_name("Test Institute")
        .targets(RecordKind::Staff, vec!["people".into()])
        .build()
        .unwrap();

    assert!(config.include_subpages());
    assert_eq!(config.depth(), 3);
    assert!(!config.render_js());
    assert!(!config.save_json());
    assert!(!config.extract_project_content());
    assert_eq!(config.max_concurrent_pages(), 8);
    assert_eq!(config.publications_limit(), 10);
    assert_eq!(config.min_strategy_yield(), 2);
    assert_eq!(config.scalar_conflict(), ScalarConflict::PreferLonger);
    assert!(config.is_excluded("https://example.org/private/page"));
    assert!(!config.is_excluded("https://example.org/index.php/login"));
    assert_eq!(config.request_timeout_secs(), 5);
    assert_eq!(config.max_retries(), 0);
    assert_eq!(config.user_agent(), "test-agent");
    assert_eq!(config.institute_name(), "Test Institute");
    assert_eq!(config.targets(RecordKind::Staff), ["people".to_string()]);
}

#[test]
fn test_base_url_without_scheme_defaults_to_http() {
    let config = ScrapeConfig::builder()
        .base_url("  www.example.org  ")
        .output_dir("out")
        .build()
        .unwrap();
    assert_eq!(config.base_url().as_str(), "http://www.example.org/");
}

#[test]
fn test_explicit_scheme_is_kept_case_insensitively() {
    let config = ScrapeConfig::builder()
        .base_url("HTTPS://Example.org/inst")
        .output_dir("out")
        .build()
        .unwrap();
    assert_eq!(config.base_url().as_str(), "https://example.org/inst/");
}

#[test]
fn test_out_of_range_values_are_rejected() {
    let field_of = |err: ConfigError| match err {
        ConfigError::InvalidValue { field, .. } => field,
        other => panic!("unexpected error: {other}"),
    };
    let builder = || {
        ScrapeConfig::builder()
            .base_url("https://example.org/")
            .output_dir("out")
    };

    assert_eq!(
        field_of(builder().max_concurrent_pages(65).build().unwrap_err()),
        "max_concurrent_pages"
    );
    assert_eq!(
        field_of(builder().publications_limit(0).build().unwrap_err()),
        "publications_limit"
    );
    assert_eq!(
        field_of(builder().request_timeout_secs(0).build().unwrap_err()),
        "request_timeout_secs"
    );
    assert_eq!(
        field_of(builder().user_agent("  ").build().unwrap_err()),
        "user_agent"
    );
}

#[test]
fn test_unusable_base_urls_are_rejected() {
    for url in [
        "ftp://example.org/",
        "FTP://example.org/",
        "http://",
        "https://exa mple.org",
    ] {
        let err = ScrapeConfig::builder()
            .base_url(url)
            .output_dir("out")
            .build()
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidBaseUrl { .. }),
            "{url}: {err:?}"
        );
    }
}

#[test]
fn test_config_loads_from_json() {
    let json = r#"{
        "base_url": "https://example.org",
        "output_dir": "out",
        "include_subpages": true,
        "depth": 2,
        "use_selenium": false,
        "save_json": true,
        "extract_project_content": false,
        "max_concurrent_pages": 4,
        "publications_limit": 20,
        "min_strategy_yield": 1,
        "scalar_conflict": "prefer_longer",
        "excluded_patterns": ["*/login*"],
        "request_timeout_secs": 10,
        "max_retries": 1,
        "user_agent": "agent",
        "institute_name": "Example",
        "targets": {"staff": ["people"]}
    }"#;
    let config = ScrapeConfig::from_json(json).unwrap();
    assert_eq!(config.base_url().as_str(), "https://example.org/");
    assert_eq!(config.depth(), 2);
    assert_eq!(config.scalar_conflict(), ScalarConflict::PreferLonger);
    assert!(config.is_excluded("https://example.org/login"));
    assert_eq!(
        config.target_urls(RecordKind::Staff),
        vec![url::Url::parse("https://example.org/people").unwrap()]
    );
    assert!(config.targets(RecordKind::News).is_empty());
}
