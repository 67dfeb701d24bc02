// Command-line front end for institute_scrape.
//
// Scrapes one institutional site and writes CSV/JSON files to the output
// directory. Exits non-zero only when the configuration is unusable.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use institute_scrape::utils::{DEFAULT_BASE_URL, DEFAULT_MAX_CONCURRENT_PAGES, DEFAULT_SUBPAGE_DEPTH};
use institute_scrape::{ScrapeConfig, ScrapeError, ScrapeOutcome, save_dataset, scrape};

#[derive(Parser, Debug)]
#[command(name = "institute-scrape")]
#[command(about = "Extract news, staff, publications and projects from an institute website", long_about = None)]
struct Cli {
    /// Base URL of the site
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    url: String,

    /// Directory the CSV/JSON files are written to
    #[arg(short, long, default_value = "data")]
    output: PathBuf,

    /// Also crawl the pages linked from every section
    #[arg(long)]
    subpages: bool,

    /// Link levels followed below the sections
    #[arg(long, default_value_t = DEFAULT_SUBPAGE_DEPTH)]
    depth: u8,

    /// Write CSV only
    #[arg(long)]
    no_json: bool,

    /// Do not request JavaScript-rendered pages
    #[arg(long)]
    no_selenium: bool,

    /// Skip fetching project detail pages
    #[arg(long)]
    no_project_content: bool,

    /// Verbose logging
    #[arg(long)]
    debug: bool,

    /// Pages fetched in parallel
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT_PAGES)]
    concurrency: usize,
}

impl Cli {
    fn to_config(&self) -> Result<ScrapeConfig, ScrapeError> {
        let config = ScrapeConfig::builder()
            .base_url(self.url.clone())
            .output_dir(self.output.clone())
            .include_subpages(self.subpages)
            .depth(self.depth)
            .save_json(!self.no_json)
            .use_selenium(!self.no_selenium)
            .extract_project_content(!self.no_project_content)
            .max_concurrent_pages(self.concurrency)
            .build()?;
        Ok(config)
    }
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_summary(outcome: &ScrapeOutcome, files: &[PathBuf]) {
    let summary = &outcome.summary;
    println!("Scrape completed in {:.1}s", summary.duration.as_secs_f64());
    println!("  pages fetched: {}", summary.pages_fetched);
    for (kind, count) in &summary.records {
        println!("  {:<16} {count}", kind.name());
    }
    println!("  subpages:        {}", outcome.dataset.all_pages.len());
    println!("  failed URLs:     {}", summary.failure_count());
    for failed in &summary.failed_urls {
        println!("    {} ({})", failed.url, failed.error);
    }
    println!("  files written:   {}", files.len());
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = match cli.to_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };
    let output_dir = config.output_dir().clone();
    let save_json = config.save_json();
    info!("Scraping {} into {}", config.base_url(), output_dir.display());

    let outcome = match scrape(config).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_fatal() => {
            error!("{e}");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e).context("Scrape failed"),
    };

    let files = save_dataset(&outcome.dataset, &output_dir, save_json)
        .await
        .context("Failed to save scraped data")?;
    print_summary(&outcome, &files);
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    run(cli).await
}
