//! Multi-strategy record extraction.
//!
//! Each record type has an [`Extractor`] holding an ordered list of
//! [`Strategy`] implementations. The extractor parses a page once, runs the
//! strategies in priority order, merges their partial records by identity
//! key and normalises the result.

// Sub-modules
pub mod contact;
pub mod document;
pub mod errors;
pub mod extractor;
pub mod extractor_set;
pub mod merger;
pub mod news;
pub mod project_detail;
pub mod projects;
pub mod publications;
pub mod research;
pub mod sections;
pub mod staff;
pub mod strategy;

// Re-exports for public API
pub use errors::{ExtractError, ParseError, StructuralParseError};
pub use extractor::Extractor;
pub use extractor_set::{ExtractorSet, PageRecords};
pub use merger::{Partial, merge};
pub use project_detail::extract_project_detail;
pub use strategy::{Strategy, Trigger};
