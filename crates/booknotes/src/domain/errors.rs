//! Domain-specific errors.

use thiserror::Error;

/// Contract violations raised by [`crate::app::store::QuoteStore`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("quote index {index} is out of range (store holds {len} quotes)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("at least two quotes are required to merge (got {found})")]
    NotEnoughToMerge { found: usize },
    #[error("highlight text cannot be empty")]
    EmptyHighlight,
}
