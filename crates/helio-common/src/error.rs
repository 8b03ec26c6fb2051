//! Error types for helio-fetch common types.

use thiserror::Error;

/// Result type alias using HelioError.
pub type HelioResult<T> = Result<T, HelioError>;

/// Primary error type for query and response handling.
#[derive(Debug, Error)]
pub enum HelioError {
    // === Query Errors ===
    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    #[error("Time range start {start} is after end {end}")]
    ReversedRange { start: String, end: String },

    // === Response Errors ===
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Row index {index} out of range for response with {len} rows")]
    RowOutOfRange { index: usize, len: usize },
}
