//! End-to-end baseline pipeline
//!
//! Temporal table, then target rescale, chronological split, per-split lag,
//! scaling fitted on training data and finally the exhaustive subset search.
//! Every stage returns a new table; the input is never modified.

use crate::config::{LagFeatureConfig, SearchConfig};
use crate::data::{ColumnDescriptor, TemporalTable};
use crate::error::{Result, SearchError};
use crate::lag::add_lag_feature;
use crate::report::{Report, StrategyComparison};
use crate::scaling::ScalingStrategy;
use crate::search::{SearchOutcome, SubsetSearch};
use crate::split::{split_table, Split};
use tracing::info;

/// Everything a pipeline run produced
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    split: Split,
    search: SearchOutcome,
    report: Report,
}

impl PipelineOutcome {
    /// The splits the search ran on, after rescaling and lagging
    pub fn split(&self) -> &Split {
        &self.split
    }

    pub fn search(&self) -> &SearchOutcome {
        &self.search
    }

    pub fn report(&self) -> &Report {
        &self.report
    }
}

/// Baseline feature-subset pipeline
#[derive(Debug, Clone)]
pub struct BaselinePipeline {
    config: SearchConfig,
}

impl BaselinePipeline {
    /// Create a pipeline; the configuration is validated up front
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Rescale, split and lag `table` without searching
    pub fn prepare(&self, table: &TemporalTable) -> Result<Split> {
        if table.schema().target() != self.config.target_column {
            return Err(SearchError::MisalignedTable {
                split: "input".to_string(),
                column: self.config.target_column.clone(),
            });
        }

        let rescaled = match self.config.target_rescale_factor {
            Some(factor) => table.scale_target(factor)?,
            None => table.clone(),
        };

        let split = split_table(&rescaled, &self.config.split_proportions)?;
        let (train, validation, test) = split.sizes();
        info!(rows = table.len(), train, validation, test, "split table");

        let split = match &self.config.lag_feature {
            Some(lag) => split.map(|part| lag_split(part, lag))?,
            None => split,
        };
        Ok(split)
    }

    /// Run the full pipeline on a clean table
    pub fn run(&self, table: &TemporalTable) -> Result<PipelineOutcome> {
        let split = self.prepare(table)?;

        let search = SubsetSearch::new(self.config.candidate_features.clone(), self.config.scaling)
            .with_parallel(self.config.parallel)
            .with_evaluation_log(self.config.record_evaluations)
            .run(&split.train, &split.validation)?;
        let report = Report::from_outcome(&search, self.config.target_rescale_factor);

        Ok(PipelineOutcome {
            split,
            search,
            report,
        })
    }
}

/// Lag one split on its own rows; an empty split stays empty but gains the column
fn lag_split(table: &TemporalTable, lag: &LagFeatureConfig) -> Result<TemporalTable> {
    if table.is_empty() {
        table.schema().require(&lag.source, "empty")?;
        let schema = table
            .schema()
            .with_predictor(ColumnDescriptor::lag_of(&lag.name, &lag.source))?;
        return Ok(TemporalTable::from_parts(schema, Vec::new()));
    }
    add_lag_feature(table, &lag.source, &lag.name)
}

/// Run the same configuration under Identity and Standardize scaling
pub fn compare_strategies(
    config: &SearchConfig,
    table: &TemporalTable,
) -> Result<StrategyComparison> {
    let identity =
        BaselinePipeline::new(config.with_scaling(ScalingStrategy::Identity))?.run(table)?;
    let standardized =
        BaselinePipeline::new(config.with_scaling(ScalingStrategy::Standardize))?.run(table)?;

    let comparison = StrategyComparison {
        identity: identity.report,
        standardized: standardized.report,
    };
    info!(agree = comparison.agree(), "compared scaling strategies");
    Ok(comparison)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic;

    #[test]
    fn test_lag_applied_per_split() {
        let table = synthetic::linear_table(20, 3, 0.5).unwrap();
        let split = BaselinePipeline::new(synthetic::linear_config())
            .unwrap()
            .prepare(&table)
            .unwrap();

        // 14 / 3 / 3 rows before lagging, one fewer each after
        assert_eq!(split.sizes(), (13, 2, 2));

        // the first validation row's lag comes from inside the validation split
        let prices = table.target_values();
        let lag = split.validation.column("previous_price").unwrap();
        assert_eq!(lag[0], prices[14]);
        assert_eq!(split.validation.rows()[0].date, table.dates()[15]);
    }

    #[test]
    fn test_rescale_applies_before_lag() {
        let table = synthetic::linear_table(20, 3, 0.5).unwrap();
        let config = SearchConfig {
            target_rescale_factor: Some(100.0),
            ..synthetic::linear_config()
        };
        let split = BaselinePipeline::new(config).unwrap().prepare(&table).unwrap();

        let prices = table.target_values();
        let train = &split.train;
        assert!((train.target_values()[0] - prices[1] * 100.0).abs() < 1e-9);
        assert!((train.column("previous_price").unwrap()[0] - prices[0] * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_target_mismatch() {
        let table = synthetic::proxy_table(20, 1).unwrap();
        let config = SearchConfig {
            target_column: "other".to_string(),
            ..synthetic::proxy_config()
        };
        let result = BaselinePipeline::new(config).unwrap().run(&table);
        assert!(matches!(result, Err(SearchError::MisalignedTable { .. })));
    }

    #[test]
    fn test_empty_test_split_keeps_schema() {
        let table = synthetic::linear_table(10, 3, 0.5).unwrap();
        let mut config = synthetic::linear_config();
        config.split_proportions.train = 0.5;
        config.split_proportions.validation = 0.5;
        config.split_proportions.test = 0.0;

        let split = BaselinePipeline::new(config).unwrap().prepare(&table).unwrap();
        assert_eq!(split.sizes(), (4, 4, 0));
        assert!(split.test.schema().contains("previous_price"));
    }
}
