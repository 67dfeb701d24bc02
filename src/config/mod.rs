//! Configuration module for a scrape run
//!
//! This module provides the `ScrapeConfig` struct and its type-safe builder
//! for configuring a scrape with validation and sensible defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{Complete, ScrapeConfigBuilder, WithBaseUrl};
pub use types::{ConfigError, DEFAULT_EXCLUDED_PATTERNS, ScrapeConfig, default_targets};
