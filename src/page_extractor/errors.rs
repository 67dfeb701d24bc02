//! Extraction failures.
//!
//! "Nothing matched" is never an error: strategies return an empty list.
//! These types cover documents that cannot be parsed at all and markup
//! that contradicts what a strategy was built to read.

use thiserror::Error;

/// The document cannot be treated as HTML.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("document is empty")]
    Empty,

    #[error("document contains no markup")]
    NotHtml,

    #[error("document contains NUL bytes")]
    Binary,

    #[error("document is {size} bytes, above the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
}

/// A strategy's assumption about the markup was violated below the level
/// of "no match". The strategy is skipped for that document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StructuralParseError {
    #[error("invalid CSS selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("table rows are ragged: {short_rows} of {rows} rows have fewer than {expected} cells")]
    RaggedTable {
        rows: usize,
        short_rows: usize,
        expected: usize,
    },

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("structural parse error: {0}")]
    Structural(#[from] StructuralParseError),
}
