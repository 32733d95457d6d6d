//! Weekly petroleum data sources
//!
//! Reads the weekly price and import/export CSV downloads, normalizes their
//! column names, aligns them on the gasoline price dates with a
//! nearest-prior-date join and derives net imports. The result is the clean
//! [`TemporalTable`] the search pipeline starts from.

use crate::data::TemporalTable;
use crate::error::{Result, SearchError};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

/// Target column name after renaming
pub const GAS_PRICE_COLUMN: &str = "Gas Prices";

/// Products whose imports, exports and net imports form the baseline predictors
pub const FLOW_PRODUCTS: [&str; 3] = [
    "Crude Oil",
    "Total Petroleum Products",
    "Crude Oil and Petroleum Products",
];

/// Header lines preceding the column names in the weekly downloads
pub const EIA_PREAMBLE_ROWS: usize = 2;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%b %d, %Y", "%m/%d/%Y", "%Y/%m/%d"];

/// Direction of a petroleum flow column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Imports,
    Exports,
}

/// Shorten a weekly flow column name, e.g.
/// `Weekly U.S. Imports of Crude Oil  (Thousand Barrels per Day)` becomes
/// `Crude Oil (Imports)`.
pub fn normalize_flow_column(name: &str, flow: Flow) -> String {
    let (prefix, tag) = match flow {
        Flow::Imports => ("Imports of", "(Imports)"),
        Flow::Exports => ("Exports of", "(Exports)"),
    };

    name.replace("Weekly U.S.", "")
        .replace(prefix, "")
        .replace("(Thousand Barrels per Day)", tag)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rename the retail gasoline price column to [`GAS_PRICE_COLUMN`]
pub fn normalize_gas_column(name: &str) -> String {
    if name.contains("Retail Gasoline Prices") {
        GAS_PRICE_COLUMN.to_string()
    } else {
        name.to_string()
    }
}

/// The nine import/export/net-import predictors, in baseline order
pub fn baseline_predictors() -> Vec<String> {
    let mut predictors = Vec::with_capacity(3 * FLOW_PRODUCTS.len());
    for flow in ["Imports", "Exports", "Net Imports"] {
        for product in FLOW_PRODUCTS {
            predictors.push(format!("{} ({})", product, flow));
        }
    }
    predictors
}

/// Parse a date in any of the accepted formats
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| SearchError::DateParseError(format!("Unrecognized date '{}'", s)))
}

/// A named numeric column that may have gaps
#[derive(Debug, Clone, PartialEq)]
pub struct NamedColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl NamedColumn {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Dated columns with possibly missing values, as read from a source file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesFrame {
    dates: Vec<NaiveDate>,
    columns: Vec<NamedColumn>,
}

impl SeriesFrame {
    /// Create a frame; dates must be strictly increasing and names unique
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<NamedColumn>) -> Result<Self> {
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(SearchError::DataError(format!(
                "Dates must be strictly increasing: {} follows {}",
                w[1], w[0]
            )));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if column.values.len() != dates.len() {
                return Err(SearchError::DataError(format!(
                    "Column '{}' has {} values for {} dates",
                    column.name,
                    column.values.len(),
                    dates.len()
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(SearchError::DataError(format!(
                    "Duplicate column name '{}'",
                    column.name
                )));
            }
        }

        Ok(Self { dates, columns })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[NamedColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Rename every column with `rename`
    pub fn rename_columns<F>(&self, rename: F) -> Result<Self>
    where
        F: Fn(&str) -> String,
    {
        let columns = self
            .columns
            .iter()
            .map(|c| NamedColumn::new(rename(&c.name), c.values.clone()))
            .collect();
        Self::new(self.dates.clone(), columns)
    }

    /// Append a column
    pub fn with_column(&self, column: NamedColumn) -> Result<Self> {
        let mut columns = self.columns.clone();
        columns.push(column);
        Self::new(self.dates.clone(), columns)
    }

    /// Drop trailing rows in which every value is missing
    pub fn trim_trailing_missing(&self) -> Self {
        let keep = (0..self.len())
            .rev()
            .find(|&i| self.columns.iter().any(|c| c.values[i].is_some()))
            .map_or(0, |i| i + 1);

        Self {
            dates: self.dates[..keep].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| NamedColumn::new(c.name.clone(), c.values[..keep].to_vec()))
                .collect(),
        }
    }

    /// Drop columns that have no values at all (e.g. from a trailing delimiter)
    pub fn drop_empty_columns(&self) -> Self {
        Self {
            dates: self.dates.clone(),
            columns: self
                .columns
                .iter()
                .filter(|c| c.values.iter().any(Option::is_some))
                .cloned()
                .collect(),
        }
    }

    /// Build a validated table, dropping rows with a missing selected value
    pub fn to_temporal_table(&self, target: &str, predictors: &[String]) -> Result<TemporalTable> {
        let lookup = |name: &str| {
            self.column(name)
                .ok_or_else(|| SearchError::DataError(format!("Column '{}' not found", name)))
        };

        let target_values = lookup(target)?;
        let predictor_values = predictors
            .iter()
            .map(|name| lookup(name))
            .collect::<Result<Vec<_>>>()?;

        let mut dates = Vec::with_capacity(self.len());
        let mut target_out = Vec::with_capacity(self.len());
        let mut predictors_out: Vec<Vec<f64>> =
            vec![Vec::with_capacity(self.len()); predictors.len()];
        let mut dropped = 0usize;

        for (i, date) in self.dates.iter().enumerate() {
            let row: Option<Vec<f64>> = predictor_values.iter().map(|values| values[i]).collect();
            match (target_values[i], row) {
                (Some(y), Some(row)) => {
                    dates.push(*date);
                    target_out.push(y);
                    for (column, value) in predictors_out.iter_mut().zip(row) {
                        column.push(value);
                    }
                }
                _ => dropped += 1,
            }
        }

        if dropped > 0 {
            warn!(dropped, kept = dates.len(), "dropped rows with missing values");
        }

        TemporalTable::from_columns(
            dates,
            target,
            target_out,
            predictors.iter().cloned().zip(predictors_out).collect(),
        )
    }
}

/// Join each `left` date with the latest `right` row dated on or before it
pub fn merge_asof_backward(left: &SeriesFrame, right: &SeriesFrame) -> Result<SeriesFrame> {
    let mut matches: Vec<Option<usize>> = Vec::with_capacity(left.len());
    let mut cursor: Option<usize> = None;
    let mut next = 0;

    for date in &left.dates {
        while next < right.len() && right.dates[next] <= *date {
            cursor = Some(next);
            next += 1;
        }
        matches.push(cursor);
    }

    let mut columns = left.columns.clone();
    for column in &right.columns {
        let values = matches
            .iter()
            .map(|m| m.and_then(|j| column.values[j]))
            .collect();
        columns.push(NamedColumn::new(column.name.clone(), values));
    }

    SeriesFrame::new(left.dates.clone(), columns)
}

/// Add `<product> (Net Imports)` = imports - exports for each product
pub fn derive_net_imports(frame: &SeriesFrame, products: &[&str]) -> Result<SeriesFrame> {
    let mut result = frame.clone();

    for product in products {
        let find = |flow: &str| {
            let name = format!("{} ({})", product, flow);
            frame
                .column(&name)
                .ok_or_else(|| SearchError::DataError(format!("Column '{}' not found", name)))
        };
        let imports = find("Imports")?;
        let exports = find("Exports")?;

        let net = imports
            .iter()
            .zip(exports.iter())
            .map(|(i, e)| match (i, e) {
                (Some(i), Some(e)) => Some(i - e),
                _ => None,
            })
            .collect();

        result = result.with_column(NamedColumn::new(format!("{} (Net Imports)", product), net))?;
    }

    Ok(result)
}

/// Assemble the baseline table from the price, imports and exports downloads
pub fn weekly_petroleum_table(
    gas_prices: &SeriesFrame,
    imports: &SeriesFrame,
    exports: &SeriesFrame,
) -> Result<TemporalTable> {
    let gas_prices = gas_prices.trim_trailing_missing().rename_columns(normalize_gas_column)?;
    let imports = imports
        .trim_trailing_missing()
        .rename_columns(|name| normalize_flow_column(name, Flow::Imports))?;
    let exports = exports
        .trim_trailing_missing()
        .rename_columns(|name| normalize_flow_column(name, Flow::Exports))?;

    let merged = merge_asof_backward(&gas_prices, &imports)?;
    let merged = merge_asof_backward(&merged, &exports)?;
    let merged = derive_net_imports(&merged, &FLOW_PRODUCTS)?;

    let table = merged.to_temporal_table(GAS_PRICE_COLUMN, &baseline_predictors())?;
    let dates = table.dates();
    info!(
        rows = table.len(),
        first = ?dates.first(),
        last = ?dates.last(),
        "assembled weekly petroleum table"
    );
    Ok(table)
}

/// Write a table as CSV with a leading `date` column
pub fn write_table_csv<P: AsRef<Path>>(table: &TemporalTable, path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["date".to_string(), table.schema().target().to_string()];
    header.extend(table.schema().predictor_names().iter().map(|s| s.to_string()));
    writer.write_record(&header)?;

    for row in table.rows() {
        let mut record = vec![row.date.format("%Y-%m-%d").to_string(), row.target.to_string()];
        record.extend(row.predictors.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Loader for weekly CSV files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Read a CSV whose first column holds dates and the rest numbers
    pub fn from_csv<P: AsRef<Path>>(path: P, skip_rows: usize) -> Result<SeriesFrame> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .with_skip_rows(skip_rows)
            .finish()?;

        Self::frame_from_dataframe(&df)
    }

    /// Read one of the weekly downloads, which carry a two-line preamble
    pub fn eia_weekly<P: AsRef<Path>>(path: P) -> Result<SeriesFrame> {
        Ok(Self::from_csv(path, EIA_PREAMBLE_ROWS)?.drop_empty_columns())
    }

    /// Read a clean merged table; every non-date column other than `target` is a predictor
    pub fn table_from_csv<P: AsRef<Path>>(path: P, target: &str) -> Result<TemporalTable> {
        let frame = Self::from_csv(path, 0)?;
        let predictors: Vec<String> = frame
            .column_names()
            .into_iter()
            .filter(|name| *name != target)
            .map(str::to_string)
            .collect();
        frame.to_temporal_table(target, &predictors)
    }

    /// Convert a DataFrame with a leading date column into a sorted frame
    pub fn frame_from_dataframe(df: &DataFrame) -> Result<SeriesFrame> {
        let series = df.get_columns();
        let date_series = series
            .first()
            .ok_or_else(|| SearchError::DataError("CSV has no columns".to_string()))?;

        let date_text = date_series.cast(&DataType::Utf8)?;
        let dates = date_text
            .utf8()?
            .into_iter()
            .enumerate()
            .map(|(i, value)| match value {
                Some(text) => parse_date(text),
                None => Err(SearchError::DataError(format!("Row {} has no date", i))),
            })
            .collect::<Result<Vec<NaiveDate>>>()?;

        let mut columns = Vec::with_capacity(series.len().saturating_sub(1));
        for s in series.iter().skip(1) {
            let numeric = s.cast(&DataType::Float64)?;
            let values: Vec<Option<f64>> = numeric.f64()?.into_iter().collect();
            columns.push(NamedColumn::new(s.name(), values));
        }

        // Some downloads list the newest week first.
        let mut order: Vec<usize> = (0..dates.len()).collect();
        order.sort_by_key(|&i| dates[i]);
        let sorted_dates = order.iter().map(|&i| dates[i]).collect();
        let sorted_columns = columns
            .into_iter()
            .map(|c| NamedColumn::new(c.name, order.iter().map(|&i| c.values[i]).collect()))
            .collect();

        SeriesFrame::new(sorted_dates, sorted_columns)
    }
}
