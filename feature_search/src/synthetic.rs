//! Seeded synthetic tables for demos and tests

use crate::config::{LagFeatureConfig, SearchConfig, PREVIOUS_PRICE_COLUMN};
use crate::data::TemporalTable;
use crate::error::{Result, SearchError};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Target column of the synthetic tables
pub const TARGET_COLUMN: &str = "price";

fn weekly_dates(n: usize) -> Result<Vec<NaiveDate>> {
    let start = NaiveDate::from_ymd_opt(2010, 6, 4)
        .ok_or_else(|| SearchError::DataError("Invalid start date".to_string()))?;
    Ok((0..n as i64).map(|w| start + Duration::weeks(w)).collect())
}

fn normal(mean: f64, std_dev: f64) -> Result<Normal<f64>> {
    // rand_distr only rejects a non-finite standard deviation
    if !(std_dev >= 0.0) || !std_dev.is_finite() {
        return Err(SearchError::InvalidConfig(format!(
            "Invalid noise standard deviation {}",
            std_dev
        )));
    }
    Normal::new(mean, std_dev).map_err(|e| {
        SearchError::InvalidConfig(format!("Invalid noise standard deviation {}: {}", std_dev, e))
    })
}

/// `price = 2 + 3 * feature1 - feature2 + N(0, noise_std^2)`
pub fn linear_table(n: usize, seed: u64, noise_std: f64) -> Result<TemporalTable> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = normal(0.0, noise_std)?;

    let feature1: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..10.0)).collect();
    let feature2: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..5.0)).collect();
    let price = feature1
        .iter()
        .zip(&feature2)
        .map(|(f1, f2)| 2.0 + 3.0 * f1 - f2 + noise.sample(&mut rng))
        .collect();

    TemporalTable::from_columns(
        weekly_dates(n)?,
        TARGET_COLUMN,
        price,
        vec![
            ("feature1".to_string(), feature1),
            ("feature2".to_string(), feature2),
        ],
    )
}

/// A drifting price, an exact linear proxy of it and two noise columns
pub fn proxy_table(n: usize, seed: u64) -> Result<TemporalTable> {
    let mut rng = StdRng::seed_from_u64(seed);
    let shock = normal(0.0, 0.3)?;
    let unit = normal(0.0, 1.0)?;

    let price: Vec<f64> = (0..n)
        .map(|i| 3.0 + 0.05 * i as f64 + shock.sample(&mut rng))
        .collect();
    let proxy = price.iter().map(|p| 0.5 * p - 1.0).collect();
    let noise_a = (0..n).map(|_| unit.sample(&mut rng)).collect();
    let noise_b = (0..n).map(|_| unit.sample(&mut rng)).collect();

    TemporalTable::from_columns(
        weekly_dates(n)?,
        TARGET_COLUMN,
        price,
        vec![
            ("noise_a".to_string(), noise_a),
            ("proxy".to_string(), proxy),
            ("noise_b".to_string(), noise_b),
        ],
    )
}

/// Configuration matching [`linear_table`]: two features plus the lagged price, logged
pub fn linear_config() -> SearchConfig {
    SearchConfig {
        target_column: TARGET_COLUMN.to_string(),
        candidate_features: vec![
            "feature1".to_string(),
            "feature2".to_string(),
            PREVIOUS_PRICE_COLUMN.to_string(),
        ],
        target_rescale_factor: None,
        lag_feature: Some(LagFeatureConfig {
            source: TARGET_COLUMN.to_string(),
            name: PREVIOUS_PRICE_COLUMN.to_string(),
        }),
        record_evaluations: true,
        ..SearchConfig::default()
    }
}

/// Configuration matching [`proxy_table`], without a lag feature
pub fn proxy_config() -> SearchConfig {
    SearchConfig {
        target_column: TARGET_COLUMN.to_string(),
        candidate_features: vec![
            "noise_a".to_string(),
            "proxy".to_string(),
            "noise_b".to_string(),
        ],
        target_rescale_factor: None,
        lag_feature: None,
        record_evaluations: true,
        ..SearchConfig::default()
    }
}
