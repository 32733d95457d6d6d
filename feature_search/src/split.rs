//! Chronological train/validation/test splitting

use crate::data::TemporalTable;
use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};

/// Tolerance on the proportion sum, so 0.7 + 0.15 + 0.15 is accepted
const SUM_TOLERANCE: f64 = 1e-9;

/// Fractions of the table assigned to each split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitProportions {
    pub train: f64,
    pub validation: f64,
    pub test: f64,
}

impl Default for SplitProportions {
    fn default() -> Self {
        Self {
            train: 0.70,
            validation: 0.15,
            test: 0.15,
        }
    }
}

impl SplitProportions {
    /// Create validated proportions
    pub fn new(train: f64, validation: f64, test: f64) -> Result<Self> {
        let proportions = Self {
            train,
            validation,
            test,
        };
        proportions.validate()?;
        Ok(proportions)
    }

    /// Each proportion must lie in [0, 1] and together they must not exceed 1
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("train", self.train),
            ("validation", self.validation),
            ("test", self.test),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SearchError::InvalidConfig(format!(
                    "{} proportion must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        let sum = self.train + self.validation + self.test;
        if sum > 1.0 + SUM_TOLERANCE {
            return Err(SearchError::InvalidConfig(format!(
                "Split proportions sum to {}, which exceeds 1",
                sum
            )));
        }

        Ok(())
    }

    /// Boundary indices `(floor(n * train), floor(n * (train + validation)))`
    pub fn boundaries(&self, n: usize) -> (usize, usize) {
        let first = ((n as f64 * self.train).floor() as usize).min(n);
        let second = ((n as f64 * (self.train + self.validation)).floor() as usize).clamp(first, n);
        (first, second)
    }
}

/// Three contiguous, order-preserving slices of a table
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: TemporalTable,
    pub validation: TemporalTable,
    pub test: TemporalTable,
}

impl Split {
    /// Apply the same transformation to every split independently
    pub fn map<F>(&self, mut f: F) -> Result<Split>
    where
        F: FnMut(&TemporalTable) -> Result<TemporalTable>,
    {
        Ok(Split {
            train: f(&self.train)?,
            validation: f(&self.validation)?,
            test: f(&self.test)?,
        })
    }

    /// Row counts of (train, validation, test)
    pub fn sizes(&self) -> (usize, usize, usize) {
        (self.train.len(), self.validation.len(), self.test.len())
    }
}

/// Partition `table` chronologically; the test split takes every remaining row.
pub fn split_table(table: &TemporalTable, proportions: &SplitProportions) -> Result<Split> {
    proportions.validate()?;

    let n = table.len();
    let (first, second) = proportions.boundaries(n);

    Ok(Split {
        train: table.slice(0, first)?,
        validation: table.slice(first, second)?,
        test: table.slice(second, n)?,
    })
}
