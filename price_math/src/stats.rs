//! Descriptive statistics and error metrics
//!
//! Standard deviations are population (ddof = 0) values, matching the
//! z-score standardization used by the feature scalers.

use crate::{MathError, Result};
use statrs::statistics::Statistics;

/// Arithmetic mean of a non-empty slice
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute the mean of an empty series".to_string(),
        ));
    }

    Ok(values.iter().mean())
}

/// Population standard deviation of a non-empty slice
pub fn population_std_dev(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute the standard deviation of an empty series".to_string(),
        ));
    }

    Ok(values.iter().population_std_dev())
}

/// Mean squared error between actual and predicted values.
///
/// NaN inputs are not filtered; they surface as a NaN result.
pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    if actual.len() != predicted.len() {
        return Err(MathError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute MSE over zero observations".to_string(),
        ));
    }

    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    Ok(sum / actual.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_mean_and_std() {
        let data = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_relative_eq!(mean(&data).unwrap(), 30.0, epsilon = 1e-12);
        // population variance = 200
        assert_relative_eq!(population_std_dev(&data).unwrap(), 200f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_constant_series_has_zero_std() {
        let data = [4.2; 6];
        assert!(population_std_dev(&data).unwrap().abs() < 1e-12);
    }

    #[test]
    fn test_mse() {
        let actual = [10.0, 20.0, 30.0, 40.0, 50.0];
        let predicted = [12.0, 18.0, 33.0, 37.0, 52.0];
        // (4 + 4 + 9 + 9 + 4) / 5
        assert_relative_eq!(mean_squared_error(&actual, &predicted).unwrap(), 6.0, epsilon = 1e-12);
    }

    #[rstest]
    #[case(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], 0.0)]
    #[case(&[0.0, 0.0], &[1.0, -1.0], 1.0)]
    #[case(&[2.5], &[0.5], 4.0)]
    fn test_mse_cases(#[case] actual: &[f64], #[case] predicted: &[f64], #[case] expected: f64) {
        let mse = mean_squared_error(actual, predicted).unwrap();
        assert_relative_eq!(mse, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_mse_rejects_bad_input() {
        assert!(matches!(
            mean_squared_error(&[1.0, 2.0], &[1.0]),
            Err(MathError::DimensionMismatch { expected: 2, got: 1 })
        ));
        assert!(matches!(
            mean_squared_error(&[], &[]),
            Err(MathError::InsufficientData(_))
        ));
        assert!(mean(&[]).is_err());
    }

    #[test]
    fn test_mse_propagates_nan() {
        let mse = mean_squared_error(&[1.0, f64::NAN], &[1.0, 2.0]).unwrap();
        assert!(mse.is_nan());
    }
}
