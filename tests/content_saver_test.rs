//! Output files written by `save_dataset`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use institute_scrape::crawl_engine::ScrapeDataset;
use institute_scrape::{ContactInfo, NewsItem, PageContent, Section, StaffMember, save_dataset};
use tempfile::TempDir;

mod common;

fn names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

fn dataset() -> ScrapeDataset {
    let mut all_pages = BTreeMap::new();
    all_pages.insert(
        "https://inst.example.org/research/analog".to_string(),
        PageContent {
            url: "https://inst.example.org/research/analog".into(),
            title: "Analog".into(),
            content: "We design converters.".into(),
            subpages: Vec::new(),
        },
    );
    ScrapeDataset {
        sections: vec![Section::new("News", "https://inst.example.org/news")],
        news: vec![NewsItem {
            title: "Open day".into(),
            date: Some("2024-03-12".into()),
            content: "Visit the labs, \"bring\" friends".into(),
            ..NewsItem::default()
        }],
        staff: vec![StaffMember {
            name: "Ana Pérez".into(),
            email: Some("ana@example.org".into()),
            ..StaffMember::default()
        }],
        contact_info: ContactInfo {
            city: Some("Sevilla".into()),
            ..ContactInfo::default()
        },
        all_pages,
        ..ScrapeDataset::default()
    }
}

#[tokio::test]
async fn test_csv_and_json_files_are_written() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("data");

    let written = save_dataset(&dataset(), &out, true).await.unwrap();

    assert_eq!(
        names(&written),
        vec![
            "sections.csv",
            "sections.json",
            "news.csv",
            "news.json",
            "staff.csv",
            "staff.json",
            "contact_info.csv",
            "contact_info.json",
            "all_pages.json",
            "all_data.json",
        ]
    );
    assert!(written.iter().all(|p| p.starts_with(&out) && p.exists()));
    // Empty lists produce no file at all.
    assert!(!out.join("publications.csv").exists());
    assert!(!out.join("project_contents.json").exists());
}

#[tokio::test]
async fn test_csv_quotes_and_headers() {
    let dir = TempDir::new().unwrap();
    save_dataset(&dataset(), dir.path(), false).await.unwrap();

    let news = std::fs::read_to_string(dir.path().join("news.csv")).unwrap();
    let mut lines = news.lines();
    assert_eq!(lines.next(), Some("title,date,date_text,content,url,image_url"));
    assert_eq!(
        lines.next(),
        Some(r#"Open day,2024-03-12,,"Visit the labs, ""bring"" friends",,"#)
    );

    let contact = std::fs::read_to_string(dir.path().join("contact_info.csv")).unwrap();
    assert_eq!(contact.lines().count(), 2);
    assert!(contact.contains("Sevilla"));
}

#[tokio::test]
async fn test_json_disabled_writes_csv_only() {
    let dir = TempDir::new().unwrap();
    let written = save_dataset(&dataset(), dir.path(), false).await.unwrap();

    assert!(written.iter().all(|p| p.extension().unwrap() == "csv"));
    assert!(!dir.path().join("all_data.json").exists());
}

#[tokio::test]
async fn test_all_data_round_trips() {
    let dir = TempDir::new().unwrap();
    let data = dataset();
    save_dataset(&data, dir.path(), true).await.unwrap();

    let json = std::fs::read_to_string(dir.path().join("all_data.json")).unwrap();
    let loaded: ScrapeDataset = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded, data);

    let contact: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("contact_info.json")).unwrap(),
    )
    .unwrap();
    assert!(contact.is_object());
    assert_eq!(contact["city"], "Sevilla");
}
