//! CSV rendering of record lists.
//!
//! Column order is the record's field order. List and map fields are
//! JSON-encoded into a single cell; missing optional values are empty.

use anyhow::{Context, Result};
use std::path::Path;

use crate::records::{
    ContactInfo, NewsItem, Project, Publication, ResearchGroup, Section, StaffMember,
};

/// A record that can be written as one CSV row.
pub trait CsvRecord {
    /// Column names, in field order.
    const HEADERS: &'static [&'static str];

    /// Cell values, one per header.
    fn row(&self) -> Vec<String>;
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn json_cell<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

impl CsvRecord for Section {
    const HEADERS: &'static [&'static str] = &["title", "url", "section_id"];

    fn row(&self) -> Vec<String> {
        vec![self.title.clone(), self.url.clone(), self.section_id.clone()]
    }
}

impl CsvRecord for NewsItem {
    const HEADERS: &'static [&'static str] =
        &["title", "date", "date_text", "content", "url", "image_url"];

    fn row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            opt(&self.date),
            opt(&self.date_text),
            self.content.clone(),
            opt(&self.url),
            opt(&self.image_url),
        ]
    }
}

impl CsvRecord for ResearchGroup {
    const HEADERS: &'static [&'static str] =
        &["name", "description", "researchers", "researchers_text"];

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.description.clone(),
            json_cell(&self.researchers),
            self.researchers_text.clone(),
        ]
    }
}

impl CsvRecord for Publication {
    const HEADERS: &'static [&'static str] =
        &["authors", "title", "venue", "year", "doi", "url", "full_text"];

    fn row(&self) -> Vec<String> {
        vec![
            self.authors.clone(),
            self.title.clone(),
            self.venue.clone(),
            self.year.map(|y| y.to_string()).unwrap_or_default(),
            opt(&self.doi),
            opt(&self.url),
            self.full_text.clone(),
        ]
    }
}

impl CsvRecord for StaffMember {
    const HEADERS: &'static [&'static str] =
        &["name", "position", "email", "phone", "department", "source_url"];

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            opt(&self.position),
            opt(&self.email),
            opt(&self.phone),
            opt(&self.department),
            self.source_url.clone(),
        ]
    }
}

impl CsvRecord for ContactInfo {
    const HEADERS: &'static [&'static str] = &[
        "institute_name",
        "address",
        "city",
        "postal_code",
        "country",
        "phone",
        "fax",
        "email",
        "website",
        "social_media",
    ];

    fn row(&self) -> Vec<String> {
        vec![
            opt(&self.institute_name),
            opt(&self.address),
            opt(&self.city),
            opt(&self.postal_code),
            opt(&self.country),
            opt(&self.phone),
            opt(&self.fax),
            opt(&self.email),
            opt(&self.website),
            json_cell(&self.social_media),
        ]
    }
}

impl CsvRecord for Project {
    const HEADERS: &'static [&'static str] = &[
        "title",
        "description",
        "period",
        "funding",
        "url",
        "principal_investigator",
    ];

    fn row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.description.clone(),
            self.period.clone(),
            opt(&self.funding),
            opt(&self.url),
            opt(&self.principal_investigator),
        ]
    }
}

/// Render `records` as CSV with a header row.
///
/// # Errors
///
/// Returns an error if the CSV writer fails.
pub fn to_csv<R: CsvRecord>(records: &[R]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(R::HEADERS)
        .context("Failed to write CSV header")?;
    for record in records {
        writer
            .write_record(record.row())
            .context("Failed to write CSV row")?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))
}

/// Write `records` to `path` as CSV.
///
/// # Errors
///
/// Returns an error if encoding or the file write fails.
pub async fn save_csv<R: CsvRecord>(records: &[R], path: &Path) -> Result<()> {
    let bytes = to_csv(records)?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
