//! Exhaustive feature-subset search
//!
//! For every non-empty subset of the candidate features an OLS model with
//! intercept is fitted on the (optionally scaled) training split, used to
//! predict the validation split, and scored by mean squared error after the
//! target scaling is inverted. Scores are therefore always in the units of the
//! validation target, whichever scaling strategy was used.

use crate::data::TemporalTable;
use crate::error::{Result, SearchError};
use crate::scaling::{FittedScaling, ScalingStrategy};
use crate::subset::{FeatureSubset, SubsetEnumerator};
use nalgebra::DMatrix;
use price_math::{stats, LinearFit, OrdinaryLeastSquares};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Upper bound on the candidate list; the search visits `2^k - 1` subsets
pub const MAX_CANDIDATE_FEATURES: usize = 24;

/// Subsets scored per rayon batch; bounds memory in parallel runs
const PARALLEL_BATCH: usize = 4096;

/// Score of one subset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetEvaluation {
    /// Position in enumeration order
    pub ordinal: usize,
    /// Selected features, in candidate order
    pub features: Vec<String>,
    /// Validation MSE, `None` when the fit failed
    pub mse: Option<f64>,
    /// Numerical rank of the training design
    pub rank: Option<usize>,
    /// The design had collinear columns; the score comes from a minimum-norm solve
    pub rank_deficient: bool,
    /// Lowest MSE among this and every earlier subset
    pub best_so_far: Option<f64>,
    /// Why the fit failed, if it did
    pub failure: Option<String>,
}

/// The winning subset of a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestSubset {
    pub subset: FeatureSubset,
    pub mse: f64,
    /// The winning fit was rank-deficient
    pub low_confidence: bool,
    /// Model fitted on the training split, in scaled units
    pub fit: LinearFit,
}

/// Running best-so-far accumulator; the best score only ever decreases
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    best: Option<BestSubset>,
    evaluated: usize,
    failed: usize,
    rank_deficient: usize,
}

impl SearchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scored subset; returns true if it became the new best.
    ///
    /// Only a strictly lower MSE replaces the current best, so among equal
    /// scores the earliest subset in enumeration order wins.
    pub fn consider(&mut self, candidate: BestSubset) -> bool {
        self.evaluated += 1;
        if candidate.low_confidence {
            self.rank_deficient += 1;
        }

        let improves = match &self.best {
            Some(best) => candidate.mse < best.mse,
            None => true,
        };
        if improves {
            self.best = Some(candidate);
        }
        improves
    }

    /// Record a subset whose fit failed
    pub fn record_failure(&mut self) {
        self.evaluated += 1;
        self.failed += 1;
    }

    pub fn best(&self) -> Option<&BestSubset> {
        self.best.as_ref()
    }

    pub fn best_mse(&self) -> Option<f64> {
        self.best.as_ref().map(|b| b.mse)
    }

    /// Subsets visited, failed ones included
    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn rank_deficient(&self) -> usize {
        self.rank_deficient
    }
}

/// Completed search: the final result plus the per-subset log
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    strategy: ScalingStrategy,
    candidates: Vec<String>,
    scaling: FittedScaling,
    evaluations: Vec<SubsetEvaluation>,
    result: SearchResult,
    best: BestSubset,
}

impl SearchOutcome {
    pub fn strategy(&self) -> ScalingStrategy {
        self.strategy
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Scalers fitted on the training split
    pub fn scaling(&self) -> &FittedScaling {
        &self.scaling
    }

    /// One entry per subset, in enumeration order; empty unless the log was requested
    pub fn evaluations(&self) -> &[SubsetEvaluation] {
        &self.evaluations
    }

    pub fn result(&self) -> &SearchResult {
        &self.result
    }

    pub fn best(&self) -> &BestSubset {
        &self.best
    }

    pub fn subsets_evaluated(&self) -> usize {
        self.result.evaluated()
    }
}

/// Training and validation columns prepared once for every subset
struct PreparedData {
    train_features: Vec<Vec<f64>>,
    train_target: Vec<f64>,
    validation_features: Vec<Vec<f64>>,
    validation_target: Vec<f64>,
    scaling: FittedScaling,
}

type SubsetScore = std::result::Result<(f64, LinearFit), String>;

/// Best-so-far accumulator plus the optional per-subset log.
///
/// Only the fit of the current best subset is retained.
struct Reduction {
    result: SearchResult,
    evaluations: Option<Vec<SubsetEvaluation>>,
}

impl Reduction {
    fn new(record_evaluations: bool) -> Self {
        Self {
            result: SearchResult::new(),
            evaluations: record_evaluations.then(Vec::new),
        }
    }

    /// Fold one scored subset into the running result
    fn absorb(&mut self, subset: FeatureSubset, score: SubsetScore) {
        let ordinal = subset.ordinal();
        let features = self.evaluations.as_ref().map(|_| subset.names().to_vec());

        let (mse, rank, rank_deficient, failure) = match score {
            Ok((mse, fit)) => {
                let rank = fit.rank();
                let rank_deficient = fit.is_rank_deficient();
                if rank_deficient {
                    debug!(
                        subset = %subset,
                        rank,
                        "rank-deficient design, minimum-norm solution used"
                    );
                }
                self.result.consider(BestSubset {
                    subset,
                    mse,
                    low_confidence: rank_deficient,
                    fit,
                });
                (Some(mse), Some(rank), rank_deficient, None)
            }
            Err(reason) => {
                warn!(subset = %subset, %reason, "subset skipped");
                self.result.record_failure();
                (None, None, false, Some(reason))
            }
        };

        let best_so_far = self.result.best_mse();
        debug!(ordinal, mse = ?mse, best = ?best_so_far, "evaluated subset");

        if let (Some(log), Some(features)) = (self.evaluations.as_mut(), features) {
            log.push(SubsetEvaluation {
                ordinal,
                features,
                mse,
                rank,
                rank_deficient,
                best_so_far,
                failure,
            });
        }
    }
}

/// Exhaustive search over the subsets of a candidate feature list
#[derive(Debug, Clone)]
pub struct SubsetSearch {
    candidates: Vec<String>,
    strategy: ScalingStrategy,
    solver: OrdinaryLeastSquares,
    parallel: bool,
    record_evaluations: bool,
}

impl SubsetSearch {
    /// Create a sequential search with an intercept-fitting OLS solver
    pub fn new(candidates: Vec<String>, strategy: ScalingStrategy) -> Self {
        Self {
            candidates,
            strategy,
            solver: OrdinaryLeastSquares::new(),
            parallel: false,
            record_evaluations: false,
        }
    }

    /// Evaluate subsets on the rayon thread pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Keep a [`SubsetEvaluation`] for every subset (memory grows with `2^k`)
    pub fn with_evaluation_log(mut self, record: bool) -> Self {
        self.record_evaluations = record;
        self
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn strategy(&self) -> ScalingStrategy {
        self.strategy
    }

    /// Candidate list must be non-empty, duplicate-free and small enough
    pub fn validate_candidates(candidates: &[String]) -> Result<()> {
        if candidates.is_empty() {
            return Err(SearchError::InvalidConfig(
                "At least one candidate feature is required".to_string(),
            ));
        }
        if candidates.len() > MAX_CANDIDATE_FEATURES {
            return Err(SearchError::InvalidConfig(format!(
                "{} candidate features exceeds the limit of {}",
                candidates.len(),
                MAX_CANDIDATE_FEATURES
            )));
        }

        let mut seen = HashSet::new();
        for name in candidates {
            if !seen.insert(name.as_str()) {
                return Err(SearchError::InvalidConfig(format!(
                    "Candidate feature '{}' is listed twice",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Both splits must carry the training target and every candidate
    fn check_alignment(&self, train: &TemporalTable, validation: &TemporalTable) -> Result<()> {
        let target = train.schema().target();
        if self.candidates.iter().any(|c| c == target) {
            return Err(SearchError::InvalidConfig(format!(
                "Target column '{}' cannot also be a candidate feature",
                target
            )));
        }
        if validation.schema().target() != target {
            return Err(SearchError::MisalignedTable {
                split: "validation".to_string(),
                column: target.to_string(),
            });
        }

        for name in &self.candidates {
            train.schema().require(name, "training")?;
            validation.schema().require(name, "validation")?;
        }

        if train.is_empty() {
            return Err(SearchError::InsufficientData(
                "Training split has no rows".to_string(),
            ));
        }
        if validation.is_empty() {
            return Err(SearchError::InsufficientData(
                "Validation split has no rows".to_string(),
            ));
        }

        Ok(())
    }

    fn prepare(&self, train: &TemporalTable, validation: &TemporalTable) -> Result<PreparedData> {
        let scaling = self.strategy.fit(train, &self.candidates)?;
        info!(
            strategy = %self.strategy,
            features = self.candidates.len(),
            rows = train.len(),
            "fitted scaling on training split"
        );

        Ok(PreparedData {
            train_features: scaling.transform_features(train, "training")?,
            train_target: scaling.transform_target(train, "training")?,
            validation_features: scaling.transform_features(validation, "validation")?,
            validation_target: validation.target_values(),
            scaling,
        })
    }

    /// Fit, predict and score one subset
    fn score(&self, data: &PreparedData, subset: &FeatureSubset) -> SubsetScore {
        let columns = subset.indices();
        let design = |features: &[Vec<f64>], rows: usize| {
            DMatrix::from_fn(rows, columns.len(), |r, c| features[columns[c]][r])
        };

        let x_train = design(&data.train_features, data.train_target.len());
        let fit = self
            .solver
            .fit(&x_train, &data.train_target)
            .map_err(|e| e.to_string())?;

        let x_validation = design(&data.validation_features, data.validation_target.len());
        let scaled_predictions = fit.predict(&x_validation).map_err(|e| e.to_string())?;
        let predictions = data.scaling.inverse_target(&scaled_predictions);

        let mse = stats::mean_squared_error(&data.validation_target, &predictions)
            .map_err(|e| e.to_string())?;
        if !mse.is_finite() {
            return Err(format!("validation MSE is {}", mse));
        }

        Ok((mse, fit))
    }

    /// Run the search over every non-empty subset of the candidates
    pub fn run(&self, train: &TemporalTable, validation: &TemporalTable) -> Result<SearchOutcome> {
        Self::validate_candidates(&self.candidates)?;
        self.check_alignment(train, validation)?;

        let data = self.prepare(train, validation)?;
        let mut enumerator = SubsetEnumerator::new(self.candidates.clone())?;
        info!(
            strategy = %self.strategy,
            candidates = self.candidates.len(),
            subsets = enumerator.total(),
            train_rows = train.len(),
            validation_rows = validation.len(),
            parallel = self.parallel,
            "starting subset search"
        );

        let mut reduction = Reduction::new(self.record_evaluations);
        if self.parallel {
            loop {
                let batch: Vec<FeatureSubset> = enumerator.by_ref().take(PARALLEL_BATCH).collect();
                if batch.is_empty() {
                    break;
                }
                let scores: Vec<SubsetScore> = batch
                    .par_iter()
                    .map(|subset| self.score(&data, subset))
                    .collect();
                // Absorb in enumeration order so ties resolve as in a sequential run.
                for (subset, score) in batch.into_iter().zip(scores) {
                    reduction.absorb(subset, score);
                }
            }
        } else {
            for subset in enumerator {
                let score = self.score(&data, &subset);
                reduction.absorb(subset, score);
            }
        }
        let Reduction {
            result,
            evaluations,
        } = reduction;

        if result.rank_deficient() > 0 {
            warn!(
                count = result.rank_deficient(),
                total = result.evaluated(),
                "some subsets had collinear features; their scores are low-confidence"
            );
        }

        let best = result.best().cloned().ok_or(SearchError::NoViableSubset)?;
        info!(
            subsets = result.evaluated(),
            best = %best.subset,
            mse = best.mse,
            "subset search finished"
        );

        Ok(SearchOutcome {
            strategy: self.strategy,
            candidates: self.candidates.clone(),
            scaling: data.scaling,
            evaluations: evaluations.unwrap_or_default(),
            result,
            best,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table(target: Vec<f64>, columns: Vec<(&str, Vec<f64>)>) -> TemporalTable {
        let start = NaiveDate::from_ymd_opt(2020, 1, 3).unwrap();
        let dates = (0..target.len() as i64)
            .map(|w| start + chrono::Duration::weeks(w))
            .collect();
        TemporalTable::from_columns(
            dates,
            "y",
            target,
            columns
                .into_iter()
                .map(|(name, values)| (name.to_string(), values))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_consider_keeps_earliest_tie() {
        let subsets: Vec<FeatureSubset> = SubsetEnumerator::new(vec!["a".into(), "b".into()])
            .unwrap()
            .collect();
        let fit = OrdinaryLeastSquares::new()
            .fit(&DMatrix::from_row_slice(2, 1, &[0.0, 1.0]), &[0.0, 1.0])
            .unwrap();

        let mut result = SearchResult::new();
        assert!(result.consider(BestSubset {
            subset: subsets[0].clone(),
            mse: 1.0,
            low_confidence: false,
            fit: fit.clone(),
        }));
        assert!(!result.consider(BestSubset {
            subset: subsets[1].clone(),
            mse: 1.0,
            low_confidence: false,
            fit: fit.clone(),
        }));
        assert!(result.consider(BestSubset {
            subset: subsets[2].clone(),
            mse: 0.5,
            low_confidence: true,
            fit,
        }));
        assert_eq!(result.best().unwrap().subset.ordinal(), 2);
        assert_eq!(result.evaluated(), 3);
        assert_eq!(result.rank_deficient(), 1);
    }

    #[test]
    fn test_selects_informative_feature() {
        let x: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let noise = vec![0.3, -0.2, 0.9, -0.7, 0.1, 0.5, -0.4, 0.8, -0.6, 0.2, -0.1, 0.4];
        let y: Vec<f64> = x.iter().map(|v| 1.0 + 2.0 * v).collect();
        let full = table(y, vec![("x", x), ("noise", noise)]);

        let train = full.slice(0, 8).unwrap();
        let validation = full.slice(8, 12).unwrap();

        let outcome = SubsetSearch::new(vec!["x".into(), "noise".into()], ScalingStrategy::Identity)
            .with_evaluation_log(true)
            .run(&train, &validation)
            .unwrap();

        assert_eq!(outcome.subsets_evaluated(), 3);
        assert!(outcome.best().subset.names().contains(&"x".to_string()));
        assert!(outcome.best().mse < 1e-12);

        // the noise-only subset is far worse
        let noise_only = &outcome.evaluations()[1];
        assert_eq!(noise_only.features, vec!["noise".to_string()]);
        assert!(noise_only.mse.unwrap() > 1.0);
    }

    #[test]
    fn test_rejects_bad_candidates() {
        let t = table(vec![1.0, 2.0, 3.0], vec![("x", vec![1.0, 2.0, 4.0])]);

        let empty = SubsetSearch::new(vec![], ScalingStrategy::Identity).run(&t, &t);
        assert!(matches!(empty, Err(SearchError::InvalidConfig(_))));

        let duplicate =
            SubsetSearch::new(vec!["x".into(), "x".into()], ScalingStrategy::Identity).run(&t, &t);
        assert!(matches!(duplicate, Err(SearchError::InvalidConfig(_))));

        let target = SubsetSearch::new(vec!["y".into()], ScalingStrategy::Identity).run(&t, &t);
        assert!(matches!(target, Err(SearchError::InvalidConfig(_))));
    }

    #[test]
    fn test_misaligned_validation_split() {
        let train = table(vec![1.0, 2.0, 3.0], vec![("x", vec![1.0, 2.0, 4.0])]);
        let validation = table(vec![4.0, 5.0], vec![("z", vec![1.0, 2.0])]);

        let result = SubsetSearch::new(vec!["x".into()], ScalingStrategy::Identity)
            .run(&train, &validation);
        match result {
            Err(SearchError::MisalignedTable { split, column }) => {
                assert_eq!(split, "validation");
                assert_eq!(column, "x");
            }
            other => panic!("expected misaligned table, got {:?}", other),
        }
    }
}
