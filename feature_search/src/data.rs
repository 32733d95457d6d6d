//! Time-indexed observation tables
//!
//! A [`TemporalTable`] is the clean, validated input of the search pipeline:
//! rows strictly ordered by date, a named target and a fixed ordered list of
//! named predictors, with a finite value in every cell. Every transformation
//! returns a new table and leaves its input untouched.

use crate::error::{Result, SearchError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Where a predictor column came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnOrigin {
    /// Observed directly in the source data
    Observed,
    /// Previous-row value of another column
    Lag { source: String },
}

/// Name and origin of a predictor column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    name: String,
    origin: ColumnOrigin,
}

impl ColumnDescriptor {
    /// Descriptor for an observed column
    pub fn observed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: ColumnOrigin::Observed,
        }
    }

    /// Descriptor for a column lagged from `source`
    pub fn lag_of(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: ColumnOrigin::Lag {
                source: source.into(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &ColumnOrigin {
        &self.origin
    }
}

/// Ordered column layout of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    target: String,
    predictors: Vec<ColumnDescriptor>,
}

impl Schema {
    /// Create a schema whose predictors are all observed columns
    pub fn new(target: impl Into<String>, predictors: Vec<String>) -> Result<Self> {
        let descriptors = predictors
            .into_iter()
            .map(ColumnDescriptor::observed)
            .collect();
        Self::with_descriptors(target, descriptors)
    }

    /// Create a schema from explicit descriptors
    pub fn with_descriptors(
        target: impl Into<String>,
        predictors: Vec<ColumnDescriptor>,
    ) -> Result<Self> {
        let target = target.into();
        if target.trim().is_empty() {
            return Err(SearchError::DataError(
                "Target column name must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        seen.insert(target.as_str());
        for descriptor in &predictors {
            if descriptor.name.trim().is_empty() {
                return Err(SearchError::DataError(
                    "Predictor column name must not be empty".to_string(),
                ));
            }
            if !seen.insert(descriptor.name.as_str()) {
                return Err(SearchError::DataError(format!(
                    "Duplicate column name '{}'",
                    descriptor.name
                )));
            }
        }

        Ok(Self { target, predictors })
    }

    /// Target column name
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Predictor descriptors in column order
    pub fn predictors(&self) -> &[ColumnDescriptor] {
        &self.predictors
    }

    /// Predictor names in column order
    pub fn predictor_names(&self) -> Vec<&str> {
        self.predictors.iter().map(|d| d.name()).collect()
    }

    /// Position of a predictor column
    pub fn predictor_index(&self, name: &str) -> Option<usize> {
        self.predictors.iter().position(|d| d.name == name)
    }

    /// True if `name` is the target or one of the predictors
    pub fn contains(&self, name: &str) -> bool {
        self.target == name || self.predictor_index(name).is_some()
    }

    /// Fail with [`SearchError::MisalignedTable`] unless `name` is present
    pub fn require(&self, name: &str, split: &str) -> Result<()> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(SearchError::MisalignedTable {
                split: split.to_string(),
                column: name.to_string(),
            })
        }
    }

    /// A copy of this schema with one more predictor appended
    pub fn with_predictor(&self, descriptor: ColumnDescriptor) -> Result<Self> {
        let mut predictors = self.predictors.clone();
        predictors.push(descriptor);
        Self::with_descriptors(self.target.clone(), predictors)
    }
}

/// One dated row of the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Period the row describes
    pub date: NaiveDate,
    /// Value of the target column
    pub target: f64,
    /// Predictor values, in schema order
    pub predictors: Vec<f64>,
}

/// Date-ordered table of observations
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalTable {
    schema: Schema,
    rows: Vec<Observation>,
}

impl TemporalTable {
    /// Create a table, validating row width, date ordering and finiteness
    pub fn new(schema: Schema, rows: Vec<Observation>) -> Result<Self> {
        let width = schema.predictors.len();

        for (i, row) in rows.iter().enumerate() {
            if row.predictors.len() != width {
                return Err(SearchError::DataError(format!(
                    "Row {} has {} predictor values, schema declares {}",
                    i,
                    row.predictors.len(),
                    width
                )));
            }
            if !row.target.is_finite() {
                return Err(SearchError::DataError(format!(
                    "Row {} ({}) has a non-finite value in '{}'",
                    i, row.date, schema.target
                )));
            }
            if let Some(j) = row.predictors.iter().position(|v| !v.is_finite()) {
                return Err(SearchError::DataError(format!(
                    "Row {} ({}) has a non-finite value in '{}'",
                    i,
                    row.date,
                    schema.predictors[j].name()
                )));
            }
            if i > 0 && rows[i - 1].date >= row.date {
                return Err(SearchError::DataError(format!(
                    "Rows must be strictly ordered by date: {} follows {}",
                    row.date,
                    rows[i - 1].date
                )));
            }
        }

        Ok(Self { schema, rows })
    }

    /// Create a table from column vectors
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        target_name: &str,
        target: Vec<f64>,
        predictors: Vec<(String, Vec<f64>)>,
    ) -> Result<Self> {
        let n = dates.len();
        if target.len() != n {
            return Err(SearchError::DataError(format!(
                "Target column has {} values for {} dates",
                target.len(),
                n
            )));
        }
        for (name, values) in &predictors {
            if values.len() != n {
                return Err(SearchError::DataError(format!(
                    "Column '{}' has {} values for {} dates",
                    name,
                    values.len(),
                    n
                )));
            }
        }

        let schema = Schema::new(
            target_name,
            predictors.iter().map(|(name, _)| name.clone()).collect(),
        )?;

        let rows = dates
            .into_iter()
            .enumerate()
            .map(|(i, date)| Observation {
                date,
                target: target[i],
                predictors: predictors.iter().map(|(_, values)| values[i]).collect(),
            })
            .collect();

        Self::new(schema, rows)
    }

    /// Get the schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Get the rows
    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    /// Get the length of the table
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Dates of every row
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// Values of the target column
    pub fn target_values(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.target).collect()
    }

    /// Values of any named column, target included
    pub fn column(&self, name: &str) -> Result<Vec<f64>> {
        if name == self.schema.target {
            return Ok(self.target_values());
        }

        let idx = self.schema.predictor_index(name).ok_or_else(|| {
            SearchError::DataError(format!("Column '{}' not found", name))
        })?;

        Ok(self.rows.iter().map(|r| r.predictors[idx]).collect())
    }

    /// Get a slice of rows `[start, end)`
    pub fn slice(&self, start: usize, end: usize) -> Result<Self> {
        if start > end || end > self.rows.len() {
            return Err(SearchError::DataError(format!(
                "Slice {}..{} is out of bounds for {} rows",
                start,
                end,
                self.rows.len()
            )));
        }

        Ok(Self {
            schema: self.schema.clone(),
            rows: self.rows[start..end].to_vec(),
        })
    }

    /// Multiply the target, and any column lagged from it, by `factor`
    pub fn scale_target(&self, factor: f64) -> Result<Self> {
        if !factor.is_finite() || factor == 0.0 {
            return Err(SearchError::InvalidConfig(format!(
                "Target rescale factor must be finite and non-zero, got {}",
                factor
            )));
        }

        let lagged: Vec<usize> = self
            .schema
            .predictors
            .iter()
            .enumerate()
            .filter(|(_, d)| {
                matches!(&d.origin, ColumnOrigin::Lag { source } if *source == self.schema.target)
            })
            .map(|(i, _)| i)
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut predictors = row.predictors.clone();
                for &i in &lagged {
                    predictors[i] *= factor;
                }
                Observation {
                    date: row.date,
                    target: row.target * factor,
                    predictors,
                }
            })
            .collect();

        Ok(Self {
            schema: self.schema.clone(),
            rows,
        })
    }

    /// Assemble a table from parts that are already known to be valid
    pub(crate) fn from_parts(schema: Schema, rows: Vec<Observation>) -> Self {
        Self { schema, rows }
    }
}
