//! Crate-wide error taxonomy and [`Result`] alias.
//!
//! A single `thiserror`-derived enum covers the spec's error surface: matrix
//! shape/construction faults, sample-shape faults, configuration faults, and
//! the I/O and JSON failures that ride in from `std::io` and `serde_json` via
//! `#[from]` conversions. Dimension pairs travel inside the variants so a
//! mismatch message always names both offending sizes.

use thiserror::Error;

/// The crate result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Every fallible operation in the crate surfaces one of these variants.
#[derive(Debug, Error)]
pub enum Error {
    /// A matrix was requested with a non-positive dimension.
    #[error("invalid matrix dimensions: {rows}x{columns}")]
    InvalidDimensions { rows: i64, columns: i64 },

    /// A flat data buffer did not match the declared matrix shape.
    #[error("data length mismatch for {rows}x{columns}: expected {expected}, got {actual}")]
    DataLength {
        rows: usize,
        columns: usize,
        expected: usize,
        actual: usize,
    },

    /// Two operands disagreed on their row count.
    #[error("row count mismatch: {0} vs {1}")]
    RowsMismatch(usize, usize),

    /// Two operands disagreed on their column count.
    #[error("column count mismatch: {0} vs {1}")]
    ColumnsMismatch(usize, usize),

    /// A matrix product had an inner-dimension mismatch.
    #[error("inner dimension mismatch: {0} vs {1}")]
    InnerDimMismatch(usize, usize),

    /// A sample side had the wrong number of rows (samples are single-row).
    #[error("sample {side} must have exactly 1 row, got {rows}")]
    SampleShape { side: &'static str, rows: usize },

    /// A configuration value violated its documented constraints.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
