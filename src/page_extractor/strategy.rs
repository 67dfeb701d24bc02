//! The strategy abstraction.
//!
//! A strategy encodes one hypothesis about how a record type is marked
//! up (semantic containers, a heading followed by paragraphs, a table,
//! dense link lists, free text). Each is a small unit behind one method,
//! iterated by an [`Extractor`](super::Extractor) in a fixed priority
//! order.

use scraper::Html;

use super::errors::StructuralParseError;
use crate::records::{PageContext, Record};

/// When a strategy takes part in an extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Runs on every document; its output complements higher-priority
    /// strategies (mixed-markup pages).
    Always,
    /// Fallback: runs only while the records gathered so far are below
    /// the extractor's minimum yield.
    BelowYield,
}

/// One parsing hypothesis for records of type `R`.
pub trait Strategy<R: Record>: Send + Sync {
    /// Stable name used for attribution and logging.
    fn name(&self) -> &'static str;

    fn trigger(&self) -> Trigger {
        Trigger::Always
    }

    /// Produce zero or more candidate records.
    ///
    /// Returns an empty list when the markup does not match. Errors are
    /// reserved for markup that matches the hypothesis but contradicts it
    /// further down.
    fn attempt(&self, doc: &Html, ctx: &PageContext<'_>) -> Result<Vec<R>, StructuralParseError>;
}
