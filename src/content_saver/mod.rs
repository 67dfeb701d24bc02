//! Output writers for a finished scrape
//!
//! Every record list is written to `<name>.csv`; with JSON enabled it is
//! also written to `<name>.json`, alongside `all_data.json`,
//! `all_pages.json` and `project_contents.json`. Empty lists are skipped
//! with a warning.

// Module declarations
mod csv_saver;
mod json_saver;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use crate::crawl_engine::ScrapeDataset;
use crate::records::RecordKind;

// Re-export public API from csv_saver module
pub use csv_saver::{CsvRecord, save_csv, to_csv};

// Re-export public API from json_saver module
pub use json_saver::{save_json_data, to_pretty_json};

/// Write `records` as `<name>.csv` (and `<name>.json`).
async fn save_records<R>(
    records: &[R],
    kind: RecordKind,
    output_dir: &Path,
    save_json: bool,
    written: &mut Vec<PathBuf>,
) -> Result<()>
where
    R: CsvRecord + Serialize + Clone + Send + 'static,
{
    let name = kind.name();
    if records.is_empty() {
        warn!(target: "institute_scrape::saver", "No data to save to {name}.csv");
        return Ok(());
    }

    let csv_path = output_dir.join(format!("{name}.csv"));
    save_csv(records, &csv_path).await?;
    written.push(csv_path);

    if save_json {
        let json_path = output_dir.join(format!("{name}.json"));
        save_json_data(records.to_vec(), &json_path).await?;
        written.push(json_path);
    }
    Ok(())
}

/// Write a JSON file unless `empty`.
async fn save_aggregate<T>(
    data: T,
    empty: bool,
    name: &str,
    output_dir: &Path,
    written: &mut Vec<PathBuf>,
) -> Result<()>
where
    T: Serialize + Send + 'static,
{
    if empty {
        warn!(target: "institute_scrape::saver", "No data to save to {name}.json");
        return Ok(());
    }
    let path = output_dir.join(format!("{name}.json"));
    save_json_data(data, &path).await?;
    written.push(path);
    Ok(())
}

/// Write the whole dataset under `output_dir` and return the files
/// written, in write order.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or any file
/// cannot be written.
pub async fn save_dataset(
    dataset: &ScrapeDataset,
    output_dir: &Path,
    save_json: bool,
) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let mut written = Vec::new();
    save_records(&dataset.sections, RecordKind::Sections, output_dir, save_json, &mut written).await?;
    save_records(&dataset.news, RecordKind::News, output_dir, save_json, &mut written).await?;
    save_records(
        &dataset.research_groups,
        RecordKind::ResearchGroups,
        output_dir,
        save_json,
        &mut written,
    )
    .await?;
    save_records(
        &dataset.publications,
        RecordKind::Publications,
        output_dir,
        save_json,
        &mut written,
    )
    .await?;
    save_records(&dataset.staff, RecordKind::Staff, output_dir, save_json, &mut written).await?;

    // Singleton: one CSV row, a JSON object rather than a list.
    let contact_name = RecordKind::ContactInfo.name();
    let contact_csv = output_dir.join(format!("{contact_name}.csv"));
    save_csv(std::slice::from_ref(&dataset.contact_info), &contact_csv).await?;
    written.push(contact_csv);
    if save_json {
        save_aggregate(
            dataset.contact_info.clone(),
            false,
            contact_name,
            output_dir,
            &mut written,
        )
        .await?;
    }

    save_records(&dataset.projects, RecordKind::Projects, output_dir, save_json, &mut written).await?;

    if save_json {
        save_aggregate(
            dataset.project_contents.clone(),
            dataset.project_contents.is_empty(),
            "project_contents",
            output_dir,
            &mut written,
        )
        .await?;
        save_aggregate(
            dataset.all_pages.clone(),
            dataset.all_pages.is_empty(),
            "all_pages",
            output_dir,
            &mut written,
        )
        .await?;
        save_aggregate(dataset.clone(), false, "all_data", output_dir, &mut written).await?;
    }

    info!(
        target: "institute_scrape::saver",
        "Saved {} files to {}",
        written.len(),
        output_dir.display()
    );
    Ok(written)
}
