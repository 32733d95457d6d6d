//! # Price Math
//!
//! Numeric kernels shared by the baseline price models.
//! This crate provides descriptive statistics, error metrics and an
//! ordinary-least-squares solver that tolerates rank-deficient designs.

use thiserror::Error;

pub mod regression;
pub mod stats;

pub use regression::{LinearFit, OrdinaryLeastSquares};
pub use stats::{mean, mean_squared_error, population_std_dev};

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MathError::DimensionMismatch {
            expected: 3,
            got: 2,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 3, got 2");

        let err = MathError::InsufficientData("no rows".to_string());
        assert!(err.to_string().contains("no rows"));
    }
}
