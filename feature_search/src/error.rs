//! Error types for the feature_search crate

use polars::prelude::PolarsError;
use price_math::MathError;
use thiserror::Error;

/// Custom error types for the feature_search crate
#[derive(Debug, Error)]
pub enum SearchError {
    /// A column has zero variance in the training data under standardization
    #[error("Degenerate scale: column '{column}' has zero variance in the training data")]
    DegenerateScale { column: String },

    /// Configuration rejected before any search begins
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A requested column is missing from one of the splits
    #[error("Misaligned table: {split} split has no column '{column}'")]
    MisalignedTable { split: String, column: String },

    /// Too few rows to carry out an operation
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Every subset failed to produce a finite score
    #[error("No subset produced a usable fit")]
    NoViableSubset,

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from numeric kernels
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error writing CSV output
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error reading or writing JSON
    #[error("JSON error: {0}")]
    JsonError(String),

    /// A date string matched none of the accepted formats
    #[error("Date parse error: {0}")]
    DateParseError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, SearchError>;

impl From<PolarsError> for SearchError {
    fn from(err: PolarsError) -> Self {
        SearchError::PolarsError(err.to_string())
    }
}

impl From<csv::Error> for SearchError {
    fn from(err: csv::Error) -> Self {
        SearchError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::JsonError(err.to_string())
    }
}
