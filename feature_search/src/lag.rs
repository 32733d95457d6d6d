//! Lag feature construction

use crate::data::{ColumnDescriptor, Observation, TemporalTable};
use crate::error::{Result, SearchError};
use tracing::debug;

/// Add `lag_name` = previous row's value of `source`, dropping the first row.
///
/// The returned table has exactly one row fewer than `table`. Applied to a
/// single split, the shift never reads outside that split.
pub fn add_lag_feature(
    table: &TemporalTable,
    source: &str,
    lag_name: &str,
) -> Result<TemporalTable> {
    if table.is_empty() {
        return Err(SearchError::InsufficientData(format!(
            "Cannot lag '{}' on an empty table",
            source
        )));
    }

    let values = table.column(source)?;
    let schema = table
        .schema()
        .with_predictor(ColumnDescriptor::lag_of(lag_name, source))?;

    let rows: Vec<Observation> = table
        .rows()
        .iter()
        .skip(1)
        .zip(values.iter())
        .map(|(row, previous)| {
            let mut predictors = row.predictors.clone();
            predictors.push(*previous);
            Observation {
                date: row.date,
                target: row.target,
                predictors,
            }
        })
        .collect();

    debug!(
        source,
        lag_name,
        rows_in = table.len(),
        rows_out = rows.len(),
        "added lag feature"
    );

    // Ordering and finiteness carry over from the validated input.
    Ok(TemporalTable::from_parts(schema, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table() -> TemporalTable {
        let dates = (0..4)
            .map(|w| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::weeks(w))
            .collect();
        TemporalTable::from_columns(
            dates,
            "price",
            vec![1.0, 2.0, 4.0, 8.0],
            vec![("volume".to_string(), vec![10.0, 20.0, 30.0, 40.0])],
        )
        .unwrap()
    }

    #[test]
    fn test_lag_shifts_by_one_row() {
        let lagged = add_lag_feature(&table(), "price", "previous_price").unwrap();
        assert_eq!(lagged.len(), 3);
        assert_eq!(lagged.target_values(), vec![2.0, 4.0, 8.0]);
        assert_eq!(lagged.column("previous_price").unwrap(), vec![1.0, 2.0, 4.0]);
        assert_eq!(lagged.column("volume").unwrap(), vec![20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_lag_of_predictor_column() {
        let lagged = add_lag_feature(&table(), "volume", "previous_volume").unwrap();
        assert_eq!(lagged.column("previous_volume").unwrap(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_lag_errors() {
        let t = table();
        assert!(add_lag_feature(&t, "missing", "lagged").is_err());
        // name clash with an existing column
        assert!(add_lag_feature(&t, "price", "volume").is_err());

        let empty = t.slice(0, 0).unwrap();
        assert!(matches!(
            add_lag_feature(&empty, "price", "previous_price"),
            Err(SearchError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_single_row_lags_to_empty() {
        let single = table().slice(0, 1).unwrap();
        let lagged = add_lag_feature(&single, "price", "previous_price").unwrap();
        assert!(lagged.is_empty());
    }
}
