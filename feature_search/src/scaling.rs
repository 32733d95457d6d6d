//! Feature and target scaling
//!
//! Scalers are fitted on the training split only and then applied, unchanged,
//! to every other split. The target scaler is invertible so predictions can be
//! scored in original units whatever strategy produced them.

use crate::data::TemporalTable;
use crate::error::{Result, SearchError};
use price_math::stats;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How feature and target columns are transformed before fitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingStrategy {
    /// Values pass through unchanged
    #[default]
    Identity,
    /// Zero mean, unit population variance using training statistics
    Standardize,
}

impl fmt::Display for ScalingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalingStrategy::Identity => write!(f, "identity"),
            ScalingStrategy::Standardize => write!(f, "standardize"),
        }
    }
}

impl std::str::FromStr for ScalingStrategy {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "identity" | "none" => Ok(ScalingStrategy::Identity),
            "standardize" | "standard" | "zscore" => Ok(ScalingStrategy::Standardize),
            other => Err(SearchError::InvalidConfig(format!(
                "Unknown scaling strategy '{}'",
                other
            ))),
        }
    }
}

impl ScalingStrategy {
    /// Fit a scaler for one column from its training values
    pub fn fit_column(&self, column: &str, training_values: &[f64]) -> Result<ColumnScaler> {
        match self {
            ScalingStrategy::Identity => Ok(ColumnScaler::Identity),
            ScalingStrategy::Standardize => {
                let mean = stats::mean(training_values)?;
                let std_dev = stats::population_std_dev(training_values)?;
                let constant = training_values.iter().all(|v| *v == training_values[0]);
                if constant || std_dev == 0.0 {
                    return Err(SearchError::DegenerateScale {
                        column: column.to_string(),
                    });
                }
                Ok(ColumnScaler::Standard { mean, std_dev })
            }
        }
    }

    /// Fit scalers for the target and each of `features` on the training split
    pub fn fit(&self, train: &TemporalTable, features: &[String]) -> Result<FittedScaling> {
        let schema = train.schema();
        let target_name = schema.target().to_string();
        let target = self.fit_column(&target_name, &train.target_values())?;

        let features = features
            .iter()
            .map(|name| {
                schema.require(name, "training")?;
                let scaler = self.fit_column(name, &train.column(name)?)?;
                Ok((name.clone(), scaler))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FittedScaling {
            strategy: *self,
            target_name,
            target,
            features,
        })
    }
}

/// A fitted affine transform for one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColumnScaler {
    Identity,
    Standard { mean: f64, std_dev: f64 },
}

impl ColumnScaler {
    /// Forward transform
    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        match *self {
            ColumnScaler::Identity => values.to_vec(),
            ColumnScaler::Standard { mean, std_dev } => {
                values.iter().map(|v| (v - mean) / std_dev).collect()
            }
        }
    }

    /// Inverse transform back to original units
    pub fn inverse_transform(&self, values: &[f64]) -> Vec<f64> {
        match *self {
            ColumnScaler::Identity => values.to_vec(),
            ColumnScaler::Standard { mean, std_dev } => {
                values.iter().map(|v| v * std_dev + mean).collect()
            }
        }
    }

    /// `(mean, std_dev)` for standard scalers
    pub fn params(&self) -> Option<(f64, f64)> {
        match *self {
            ColumnScaler::Identity => None,
            ColumnScaler::Standard { mean, std_dev } => Some((mean, std_dev)),
        }
    }
}

/// Scalers for a target and an ordered list of features, fitted on training data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedScaling {
    strategy: ScalingStrategy,
    target_name: String,
    target: ColumnScaler,
    features: Vec<(String, ColumnScaler)>,
}

impl FittedScaling {
    pub fn strategy(&self) -> ScalingStrategy {
        self.strategy
    }

    /// Scaler fitted on the target column
    pub fn target(&self) -> &ColumnScaler {
        &self.target
    }

    /// Scaler fitted on a feature column
    pub fn feature(&self, name: &str) -> Option<&ColumnScaler> {
        self.features
            .iter()
            .find(|(feature, _)| feature == name)
            .map(|(_, scaler)| scaler)
    }

    /// Feature names in fitted order
    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Transformed feature columns of `table`, in fitted order
    pub fn transform_features(&self, table: &TemporalTable, split: &str) -> Result<Vec<Vec<f64>>> {
        self.features
            .iter()
            .map(|(name, scaler)| {
                table.schema().require(name, split)?;
                Ok(scaler.transform(&table.column(name)?))
            })
            .collect()
    }

    /// Transformed target column of `table`
    pub fn transform_target(&self, table: &TemporalTable, split: &str) -> Result<Vec<f64>> {
        if table.schema().target() != self.target_name {
            return Err(SearchError::MisalignedTable {
                split: split.to_string(),
                column: self.target_name.clone(),
            });
        }
        Ok(self.target.transform(&table.target_values()))
    }

    /// Map predictions made in scaled target units back to original units
    pub fn inverse_target(&self, values: &[f64]) -> Vec<f64> {
        self.target.inverse_transform(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_standard_params_are_population_moments() {
        let scaler = ScalingStrategy::Standardize
            .fit_column("x", &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])
            .unwrap();
        let (mean, std_dev) = scaler.params().unwrap();
        assert_relative_eq!(mean, 5.0, epsilon = 1e-12);
        assert_relative_eq!(std_dev, 2.0, epsilon = 1e-12);
        let scaled = scaler.transform(&[7.0, 3.0]);
        assert_relative_eq!(scaled[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(scaled[1], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_variance_is_an_error() {
        let result = ScalingStrategy::Standardize.fit_column("flat", &[3.0, 3.0, 3.0]);
        match result {
            Err(SearchError::DegenerateScale { column }) => assert_eq!(column, "flat"),
            other => panic!("expected degenerate scale error, got {:?}", other),
        }
        // identity never inspects the data
        assert!(ScalingStrategy::Identity.fit_column("flat", &[3.0, 3.0]).is_ok());
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("Standardize".parse::<ScalingStrategy>().unwrap(), ScalingStrategy::Standardize);
        assert_eq!("identity".parse::<ScalingStrategy>().unwrap(), ScalingStrategy::Identity);
        assert!("minmax".parse::<ScalingStrategy>().is_err());
        assert_eq!(ScalingStrategy::Standardize.to_string(), "standardize");
    }

    #[test]
    fn test_strategy_serde_names() {
        let json = serde_json::to_string(&ScalingStrategy::Standardize).unwrap();
        assert_eq!(json, "\"standardize\"");
        let parsed: ScalingStrategy = serde_json::from_str("\"identity\"").unwrap();
        assert_eq!(parsed, ScalingStrategy::Identity);
    }
}
