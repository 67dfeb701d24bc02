//! Core configuration types for a scrape run
//!
//! This module contains the `ScrapeConfig` struct, the candidate page paths
//! per record type and the configuration error taxonomy.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::records::{RecordKind, ScalarConflict};
use crate::utils::{
    BROWSER_USER_AGENT, DEFAULT_BASE_URL, DEFAULT_INSTITUTE_NAME, DEFAULT_MAX_CONCURRENT_PAGES,
    DEFAULT_MAX_RETRIES, DEFAULT_MIN_STRATEGY_YIELD, DEFAULT_PUBLICATIONS_LIMIT,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SUBPAGE_DEPTH,
};

/// Errors detected before any page task is dispatched. Always fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid exclusion pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Base URL {url} is unreachable: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Configuration for one scrape of one site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    pub(crate) base_url: Url,
    pub(crate) output_dir: PathBuf,
    pub(crate) include_subpages: bool,
    /// Subpage levels below the sections; 0 = sections only.
    pub(crate) depth: u8,
    /// Ask the fetcher for JavaScript-rendered pages.
    pub(crate) use_selenium: bool,
    pub(crate) save_json: bool,
    pub(crate) extract_project_content: bool,
    pub(crate) max_concurrent_pages: usize,
    pub(crate) publications_limit: usize,
    pub(crate) min_strategy_yield: usize,
    pub(crate) scalar_conflict: ScalarConflict,
    pub(crate) excluded_patterns: Vec<String>,

    /// Compiled regex patterns from `excluded_patterns`
    /// Pre-compiled at config creation to avoid hot-path regex compilation
    #[serde(skip)]
    pub(crate) excluded_patterns_compiled: Vec<Regex>,

    pub(crate) request_timeout_secs: u64,
    pub(crate) max_retries: u8,
    pub(crate) user_agent: String,
    pub(crate) institute_name: String,

    /// Candidate paths per record type, resolved against `base_url`.
    pub(crate) targets: BTreeMap<RecordKind, Vec<String>>,
}

static DEFAULT_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse(DEFAULT_BASE_URL).expect("BUG: hardcoded DEFAULT_BASE_URL is not a valid URL")
});

/// Exclusions applied to discovered subpage links unless overridden.
pub const DEFAULT_EXCLUDED_PATTERNS: &[&str] = &[
    "*/component/users*",
    "*/login*",
    "*format=feed*",
    "*/print*",
];

static DEFAULT_EXCLUDED_COMPILED: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    DEFAULT_EXCLUDED_PATTERNS
        .iter()
        .map(|p| {
            super::builder::compile_glob_pattern(p)
                .expect("BUG: hardcoded exclusion pattern does not compile")
        })
        .collect()
});

/// Paths the site has used for each record type, most likely first.
#[must_use]
pub fn default_targets() -> BTreeMap<RecordKind, Vec<String>> {
    let paths: [(RecordKind, &[&str]); 6] = [
        (
            RecordKind::News,
            &[
                "index.php/en/news",
                "index.php/es/es-es/noticias",
                "index.php/es/noticias",
                "noticias",
                "news",
                "en/news",
            ],
        ),
        (
            RecordKind::Staff,
            &[
                "index.php/en/people",
                "index.php/es/personal",
                "index.php/en/staff",
                "personal",
                "staff",
                "people",
                "team",
            ],
        ),
        (
            RecordKind::Publications,
            &[
                "index.php/en/publications",
                "index.php/es/publicaciones",
                "publicaciones",
                "publications",
                "en/publications",
            ],
        ),
        (
            RecordKind::ResearchGroups,
            &[
                "index.php/en/research",
                "index.php/es/investigacion",
                "investigacion",
                "research",
                "research-groups",
                "en/research-groups",
            ],
        ),
        (
            RecordKind::ContactInfo,
            // "" is the home page, whose footer carries the address.
            &["index.php/en/contact", "index.php/es/contacto", "contacto", "contact", ""],
        ),
        (
            RecordKind::Projects,
            &[
                "es/proyectos.php",
                "index.php/es/proyectos",
                "es/proyectos",
                "proyectos",
                "index.php/en/projects",
                "en/projects",
                "projects",
            ],
        ),
    ];
    paths
        .into_iter()
        .map(|(kind, list)| (kind, list.iter().map(|p| (*p).to_string()).collect()))
        .collect()
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_URL.clone(),
            output_dir: PathBuf::from("data"),
            include_subpages: false,
            depth: DEFAULT_SUBPAGE_DEPTH,
            use_selenium: true,
            save_json: true,
            extract_project_content: true,
            max_concurrent_pages: DEFAULT_MAX_CONCURRENT_PAGES,
            publications_limit: DEFAULT_PUBLICATIONS_LIMIT,
            min_strategy_yield: DEFAULT_MIN_STRATEGY_YIELD,
            scalar_conflict: ScalarConflict::default(),
            excluded_patterns: DEFAULT_EXCLUDED_PATTERNS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            excluded_patterns_compiled: DEFAULT_EXCLUDED_COMPILED.clone(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            user_agent: BROWSER_USER_AGENT.to_string(),
            institute_name: DEFAULT_INSTITUTE_NAME.to_string(),
            targets: default_targets(),
        }
    }
}
