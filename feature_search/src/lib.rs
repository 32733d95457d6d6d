//! # Feature Search
//!
//! Exhaustive feature-subset selection for a baseline linear model of weekly
//! U.S. gasoline prices against crude-oil and petroleum import/export volumes.
//!
//! ## Features
//!
//! - Weekly CSV loading, column normalization and nearest-prior-date merging
//! - Validated time-indexed tables with an explicit column schema
//! - Chronological train/validation/test splitting and per-split lag features
//! - Identity or standardized scaling, fitted on training data only
//! - OLS fit and validation MSE for every non-empty feature subset, optionally in parallel
//! - Text, JSON and CSV reports
//!
//! ## Quick Start
//!
//! ```no_run
//! use feature_search::{BaselinePipeline, DataLoader, SearchConfig};
//!
//! let config = SearchConfig::default();
//! let table = DataLoader::table_from_csv("merged.csv", &config.target_column)?;
//!
//! let outcome = BaselinePipeline::new(config)?.run(&table)?;
//! println!("{}", outcome.report());
//! # Ok::<(), feature_search::SearchError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod lag;
pub mod pipeline;
pub mod report;
pub mod scaling;
pub mod search;
pub mod source;
pub mod split;
pub mod subset;
pub mod synthetic;

// Re-export commonly used types
pub use crate::config::{LagFeatureConfig, SearchConfig};
pub use crate::data::{ColumnDescriptor, ColumnOrigin, Observation, Schema, TemporalTable};
pub use crate::error::{Result, SearchError};
pub use crate::lag::add_lag_feature;
pub use crate::pipeline::{compare_strategies, BaselinePipeline, PipelineOutcome};
pub use crate::report::{Report, StrategyComparison};
pub use crate::scaling::{ColumnScaler, FittedScaling, ScalingStrategy};
pub use crate::search::{SearchOutcome, SearchResult, SubsetEvaluation, SubsetSearch};
pub use crate::source::{DataLoader, SeriesFrame};
pub use crate::split::{split_table, Split, SplitProportions};
pub use crate::subset::{FeatureSubset, SubsetEnumerator};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
