//! Search summaries
//!
//! A [`Report`] is a pure function of a completed search. Its MSE is in the
//! units of the target the search saw, i.e. after any rescale factor; the raw
//! unit figure divides the factor back out.

use crate::error::Result;
use crate::scaling::ScalingStrategy;
use crate::search::{SearchOutcome, SubsetEvaluation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Summary of a completed search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub subsets_evaluated: usize,
    pub best_subset: Vec<String>,
    pub best_mse: f64,
    pub scaling: ScalingStrategy,
    pub target_rescale_factor: Option<f64>,
    /// `best_mse / factor^2`
    pub raw_unit_mse: f64,
    pub low_confidence: bool,
    pub failed_subsets: usize,
    pub rank_deficient_subsets: usize,
}

impl Report {
    pub fn from_outcome(outcome: &SearchOutcome, target_rescale_factor: Option<f64>) -> Self {
        let best = outcome.best();
        let factor = target_rescale_factor.unwrap_or(1.0);

        Self {
            subsets_evaluated: outcome.subsets_evaluated(),
            best_subset: best.subset.names().to_vec(),
            best_mse: best.mse,
            scaling: outcome.strategy(),
            target_rescale_factor,
            raw_unit_mse: best.mse / (factor * factor),
            low_confidence: best.low_confidence,
            failed_subsets: outcome.result().failed(),
            rank_deficient_subsets: outcome.result().rank_deficient(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Best subset rendered as `['a', 'b']`
    pub fn best_subset_label(&self) -> String {
        let quoted: Vec<String> = self.best_subset.iter().map(|n| format!("'{}'", n)).collect();
        format!("[{}]", quoted.join(", "))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Among {} ways of feature combinations,",
            self.subsets_evaluated
        )?;
        write!(
            f,
            "Best Combination: {}, Best MSE: {}",
            self.best_subset_label(),
            self.best_mse
        )?;
        if let Some(factor) = self.target_rescale_factor {
            write!(
                f,
                "\nTarget rescaled by {}; MSE in original units: {}",
                factor, self.raw_unit_mse
            )?;
        }
        if self.low_confidence {
            write!(f, "\nWarning: best subset has collinear features (low confidence)")?;
        }
        Ok(())
    }
}

/// One CSV line of the evaluation log
#[derive(Debug, Serialize)]
struct EvaluationRow<'a> {
    ordinal: usize,
    features: String,
    mse: Option<f64>,
    rank: Option<usize>,
    rank_deficient: bool,
    best_so_far: Option<f64>,
    failure: Option<&'a str>,
}

/// Write the per-subset log as CSV; features are joined with `" + "`
pub fn write_evaluations_csv<W: Write>(evaluations: &[SubsetEvaluation], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for evaluation in evaluations {
        writer.serialize(EvaluationRow {
            ordinal: evaluation.ordinal,
            features: evaluation.features.join(" + "),
            mse: evaluation.mse,
            rank: evaluation.rank,
            rank_deficient: evaluation.rank_deficient,
            best_so_far: evaluation.best_so_far,
            failure: evaluation.failure.as_deref(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the per-subset log to a CSV file
pub fn save_evaluations_csv<P: AsRef<Path>>(
    evaluations: &[SubsetEvaluation],
    path: P,
) -> Result<()> {
    write_evaluations_csv(evaluations, File::create(path)?)
}

/// Winners of the same search under both scaling strategies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub identity: Report,
    pub standardized: Report,
}

impl StrategyComparison {
    /// Both strategies picked the same subset
    pub fn agree(&self) -> bool {
        self.identity.best_subset == self.standardized.best_subset
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for StrategyComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Without scaling:")?;
        writeln!(f, "{}", self.identity)?;
        writeln!(f)?;
        writeln!(f, "With standardization:")?;
        writeln!(f, "{}", self.standardized)?;
        writeln!(f)?;
        if self.agree() {
            write!(
                f,
                "Both strategies select {}",
                self.identity.best_subset_label()
            )
        } else {
            write!(
                f,
                "Strategies disagree: {} vs {}",
                self.identity.best_subset_label(),
                self.standardized.best_subset_label()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn report() -> Report {
        Report {
            subsets_evaluated: 1023,
            best_subset: vec!["Crude Oil (Imports)".to_string(), "previous_price".to_string()],
            best_mse: 25.0,
            scaling: ScalingStrategy::Identity,
            target_rescale_factor: Some(100.0),
            raw_unit_mse: 0.0025,
            low_confidence: false,
            failed_subsets: 0,
            rank_deficient_subsets: 0,
        }
    }

    #[test]
    fn test_display_phrasing() {
        let text = report().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Among 1023 ways of feature combinations,");
        assert_eq!(
            lines[1],
            "Best Combination: ['Crude Oil (Imports)', 'previous_price'], Best MSE: 25"
        );
        assert!(lines[2].contains("0.0025"));
    }

    #[test]
    fn test_json_round_trip() {
        let original = report();
        let parsed: Report = serde_json::from_str(&original.to_json().unwrap()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_evaluations_csv() {
        let evaluations = vec![
            SubsetEvaluation {
                ordinal: 0,
                features: vec!["a".to_string()],
                mse: Some(2.0),
                rank: Some(1),
                rank_deficient: false,
                best_so_far: Some(2.0),
                failure: None,
            },
            SubsetEvaluation {
                ordinal: 1,
                features: vec!["a".to_string(), "b".to_string()],
                mse: None,
                rank: None,
                rank_deficient: false,
                best_so_far: Some(2.0),
                failure: Some("singular".to_string()),
            },
        ];

        let mut buffer = Vec::new();
        write_evaluations_csv(&evaluations, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "ordinal,features,mse,rank,rank_deficient,best_so_far,failure"
        );
        assert_eq!(lines[1], "0,a,2.0,1,false,2.0,");
        assert_eq!(lines[2], "1,a + b,,,false,2.0,singular");
    }

    #[test]
    fn test_comparison_agreement() {
        let comparison = StrategyComparison {
            identity: report(),
            standardized: Report {
                scaling: ScalingStrategy::Standardize,
                ..report()
            },
        };
        assert!(comparison.agree());
        assert!(comparison.to_string().contains("Both strategies select"));
    }
}
