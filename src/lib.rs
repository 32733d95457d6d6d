//! # Gas Baseline
//!
//! `gas_baseline` bundles the crates of the baseline gasoline price study:
//!
//! - [`price_math`]: statistics, error metrics and a rank-tolerant OLS solver
//! - [`feature_search`]: data sources, splitting, scaling and the exhaustive
//!   feature-subset search
//!
//! ## Example
//!
//! ```
//! use gas_baseline::feature_search::{synthetic, BaselinePipeline};
//!
//! let table = synthetic::linear_table(40, 7, 0.5)?;
//! let outcome = BaselinePipeline::new(synthetic::linear_config())?.run(&table)?;
//! assert_eq!(outcome.report().subsets_evaluated, 7);
//! # Ok::<(), gas_baseline::feature_search::SearchError>(())
//! ```

pub use feature_search;
pub use price_math;

/// Workspace version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
