//! Ordinary least squares regression
//!
//! The intercept is handled by centering: feature columns and the target are
//! shifted by their means, the centred system is solved by SVD, and the
//! intercept is recovered as `mean(y) - mean(x) . beta`. Singular values at or
//! below `sigma_max * max(n, p) * f64::EPSILON` are treated as zero, which yields
//! the minimum-norm solution when columns are collinear instead of failing.

use crate::{MathError, Result};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Least-squares solver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdinaryLeastSquares {
    fit_intercept: bool,
}

impl Default for OrdinaryLeastSquares {
    fn default() -> Self {
        Self::new()
    }
}

impl OrdinaryLeastSquares {
    /// Create a solver that fits an intercept
    pub fn new() -> Self {
        Self {
            fit_intercept: true,
        }
    }

    /// Create a solver with or without an intercept term
    pub fn with_intercept(fit_intercept: bool) -> Self {
        Self { fit_intercept }
    }

    /// Whether the solver fits an intercept
    pub fn fits_intercept(&self) -> bool {
        self.fit_intercept
    }

    /// Fit `y ~ x` where `x` is an `n x p` design matrix without a ones column.
    pub fn fit(&self, x: &DMatrix<f64>, y: &[f64]) -> Result<LinearFit> {
        let (n, p) = x.shape();
        if y.len() != n {
            return Err(MathError::DimensionMismatch {
                expected: n,
                got: y.len(),
            });
        }
        if n == 0 {
            return Err(MathError::InsufficientData(
                "Cannot fit a linear model on zero observations".to_string(),
            ));
        }
        if p == 0 {
            return Err(MathError::InvalidInput(
                "Design matrix has no feature columns".to_string(),
            ));
        }

        let (x_means, y_mean) = if self.fit_intercept {
            let x_means: Vec<f64> = (0..p).map(|j| x.column(j).sum() / n as f64).collect();
            let y_mean = y.iter().sum::<f64>() / n as f64;
            (x_means, y_mean)
        } else {
            (vec![0.0; p], 0.0)
        };

        let centred = DMatrix::from_fn(n, p, |i, j| x[(i, j)] - x_means[j]);
        let target = DVector::from_iterator(n, y.iter().map(|v| v - y_mean));

        // Every column is constant: the best fit is the target mean.
        if centred.iter().all(|v| *v == 0.0) {
            return Ok(LinearFit {
                intercept: y_mean,
                coefficients: vec![0.0; p],
                rank: 0,
            });
        }

        let svd = centred.svd(true, true);
        let sigma_max = svd
            .singular_values
            .iter()
            .cloned()
            .fold(0.0_f64, f64::max);
        let tolerance = sigma_max * n.max(p) as f64 * f64::EPSILON;
        let rank = svd.rank(tolerance);

        let beta = svd
            .solve(&target, tolerance)
            .map_err(|e| MathError::CalculationError(e.to_string()))?;

        let coefficients: Vec<f64> = beta.iter().cloned().collect();
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(MathError::CalculationError(
                "Least-squares solve produced non-finite coefficients".to_string(),
            ));
        }

        let intercept = y_mean
            - x_means
                .iter()
                .zip(coefficients.iter())
                .map(|(m, b)| m * b)
                .sum::<f64>();

        Ok(LinearFit {
            intercept,
            coefficients,
            rank,
        })
    }
}

/// A fitted linear model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    intercept: f64,
    coefficients: Vec<f64>,
    rank: usize,
}

impl LinearFit {
    /// Intercept term
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Coefficients in design-matrix column order
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Numerical rank of the (centred) design matrix
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// True when the design matrix had fewer independent columns than features
    pub fn is_rank_deficient(&self) -> bool {
        self.rank < self.coefficients.len()
    }

    /// Predict the target for each row of `x`
    pub fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<f64>> {
        if x.ncols() != self.coefficients.len() {
            return Err(MathError::DimensionMismatch {
                expected: self.coefficients.len(),
                got: x.ncols(),
            });
        }

        let beta = DVector::from_column_slice(&self.coefficients);
        let predictions = x * beta;

        Ok(predictions.iter().map(|v| v + self.intercept).collect())
    }
}
