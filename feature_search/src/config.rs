//! Search configuration

use crate::error::{Result, SearchError};
use crate::scaling::ScalingStrategy;
use crate::search::SubsetSearch;
use crate::source::{baseline_predictors, GAS_PRICE_COLUMN};
use crate::split::SplitProportions;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Name of the lagged target column in the baseline setup
pub const PREVIOUS_PRICE_COLUMN: &str = "previous_price";

/// Derive a "previous value" predictor from `source`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LagFeatureConfig {
    pub source: String,
    pub name: String,
}

/// Everything the pipeline needs besides the data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Column to predict
    pub target_column: String,
    /// Features to search over, in canonical order
    pub candidate_features: Vec<String>,
    pub split_proportions: SplitProportions,
    pub scaling: ScalingStrategy,
    /// Multiplier applied to the target before anything else; MSE scales by its square
    pub target_rescale_factor: Option<f64>,
    /// Lag feature added to each split after splitting
    pub lag_feature: Option<LagFeatureConfig>,
    /// Evaluate subsets on the rayon pool
    pub parallel: bool,
    /// Keep one log entry per subset; off by default since it grows with `2^k`
    pub record_evaluations: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let mut candidate_features = baseline_predictors();
        candidate_features.push(PREVIOUS_PRICE_COLUMN.to_string());

        Self {
            target_column: GAS_PRICE_COLUMN.to_string(),
            candidate_features,
            split_proportions: SplitProportions::default(),
            scaling: ScalingStrategy::Identity,
            target_rescale_factor: Some(100.0),
            lag_feature: Some(LagFeatureConfig {
                source: GAS_PRICE_COLUMN.to_string(),
                name: PREVIOUS_PRICE_COLUMN.to_string(),
            }),
            parallel: false,
            record_evaluations: false,
        }
    }
}

impl SearchConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: SearchConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The same configuration with a different scaling strategy
    pub fn with_scaling(&self, scaling: ScalingStrategy) -> Self {
        Self {
            scaling,
            ..self.clone()
        }
    }

    /// Effective rescale factor (1 when unset)
    pub fn rescale_factor(&self) -> f64 {
        self.target_rescale_factor.unwrap_or(1.0)
    }

    /// Reject configurations that cannot produce a meaningful search
    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(SearchError::InvalidConfig(
                "target_column must not be empty".to_string(),
            ));
        }

        SubsetSearch::validate_candidates(&self.candidate_features)?;
        if self.candidate_features.contains(&self.target_column) {
            return Err(SearchError::InvalidConfig(format!(
                "Target column '{}' cannot also be a candidate feature",
                self.target_column
            )));
        }

        self.split_proportions.validate()?;
        if self.split_proportions.train == 0.0 || self.split_proportions.validation == 0.0 {
            return Err(SearchError::InvalidConfig(
                "Train and validation proportions must both be positive".to_string(),
            ));
        }

        if let Some(factor) = self.target_rescale_factor {
            if !factor.is_finite() || factor == 0.0 {
                return Err(SearchError::InvalidConfig(format!(
                    "target_rescale_factor must be finite and non-zero, got {}",
                    factor
                )));
            }
        }

        if let Some(lag) = &self.lag_feature {
            if lag.name.trim().is_empty() || lag.name == self.target_column {
                return Err(SearchError::InvalidConfig(format!(
                    "Invalid lag feature name '{}'",
                    lag.name
                )));
            }
        }

        Ok(())
    }
}
