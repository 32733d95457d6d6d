use feature_search::report::save_evaluations_csv;
use feature_search::{
    compare_strategies, synthetic, BaselinePipeline, ScalingStrategy, SearchConfig,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::tempdir;

const NOISE_STD: f64 = 0.5;

#[test]
fn test_end_to_end_linear_scenario() {
    let table = synthetic::linear_table(20, 42, NOISE_STD).unwrap();
    let config = synthetic::linear_config();
    assert_eq!(config.scaling, ScalingStrategy::Identity);

    let outcome = BaselinePipeline::new(config).unwrap().run(&table).unwrap();
    let report = outcome.report();

    assert_eq!(report.subsets_evaluated, 7);
    assert!(report.best_subset.contains(&"feature1".to_string()));
    assert!(report.best_mse < 4.0 * NOISE_STD * NOISE_STD);
    assert_eq!(report.target_rescale_factor, None);
    assert_eq!(report.raw_unit_mse, report.best_mse);
}

#[rstest]
#[case(ScalingStrategy::Identity)]
#[case(ScalingStrategy::Standardize)]
fn test_exact_proxy_wins_under_both_strategies(#[case] strategy: ScalingStrategy) {
    let table = synthetic::proxy_table(60, 11).unwrap();
    let config = synthetic::proxy_config().with_scaling(strategy);

    let outcome = BaselinePipeline::new(config).unwrap().run(&table).unwrap();
    let report = outcome.report();

    assert_eq!(report.scaling, strategy);
    assert!(report.best_subset.contains(&"proxy".to_string()));
    assert!(report.best_mse < 1e-12);

    // every subset without the proxy is clearly worse
    for evaluation in outcome.search().evaluations() {
        if !evaluation.features.contains(&"proxy".to_string()) {
            assert!(evaluation.mse.unwrap() > 1e-6);
        }
    }
}

#[test]
fn test_compare_strategies_reports_both() {
    let table = synthetic::proxy_table(60, 3).unwrap();
    let comparison = compare_strategies(&synthetic::proxy_config(), &table).unwrap();

    assert_eq!(comparison.identity.scaling, ScalingStrategy::Identity);
    assert_eq!(comparison.standardized.scaling, ScalingStrategy::Standardize);
    assert_eq!(comparison.identity.subsets_evaluated, 7);
    assert!(comparison.identity.best_subset.contains(&"proxy".to_string()));
    assert!(comparison.standardized.best_subset.contains(&"proxy".to_string()));
}

#[test]
fn test_rescale_factor_reported() {
    let table = synthetic::linear_table(60, 5, NOISE_STD).unwrap();
    let plain = BaselinePipeline::new(synthetic::linear_config())
        .unwrap()
        .run(&table)
        .unwrap();
    let config = SearchConfig {
        target_rescale_factor: Some(100.0),
        ..synthetic::linear_config()
    };
    let scaled = BaselinePipeline::new(config).unwrap().run(&table).unwrap();

    let (plain, scaled) = (plain.report(), scaled.report());
    assert_eq!(scaled.best_subset, plain.best_subset);
    assert!((scaled.best_mse / 10_000.0 - plain.best_mse).abs() <= 1e-9 * plain.best_mse.max(1.0));
    assert!((scaled.raw_unit_mse - plain.best_mse).abs() <= 1e-9 * plain.best_mse.max(1.0));
    assert!(scaled.to_string().contains("Target rescaled by 100"));
}

#[test]
fn test_report_outputs() {
    let table = synthetic::linear_table(40, 8, NOISE_STD).unwrap();
    let outcome = BaselinePipeline::new(synthetic::linear_config())
        .unwrap()
        .run(&table)
        .unwrap();

    let text = outcome.report().to_string();
    assert!(text.starts_with("Among 7 ways of feature combinations,\nBest Combination: ['"));

    let json: serde_json::Value =
        serde_json::from_str(&outcome.report().to_json().unwrap()).unwrap();
    assert_eq!(json["subsets_evaluated"], 7);
    assert_eq!(json["scaling"], "identity");

    let dir = tempdir().unwrap();
    let path = dir.path().join("evaluations.csv");
    save_evaluations_csv(outcome.search().evaluations(), &path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written.lines().count(), 8);
    assert!(written.lines().nth(7).unwrap().starts_with("6,feature1 + feature2 + previous_price,"));
}

#[test]
fn test_parallel_pipeline_matches_sequential() {
    let table = synthetic::linear_table(50, 21, NOISE_STD).unwrap();
    let sequential = BaselinePipeline::new(synthetic::linear_config())
        .unwrap()
        .run(&table)
        .unwrap();
    let config = SearchConfig {
        parallel: true,
        ..synthetic::linear_config()
    };
    let parallel = BaselinePipeline::new(config).unwrap().run(&table).unwrap();

    assert_eq!(parallel.report(), sequential.report());
    assert_eq!(parallel.search().evaluations(), sequential.search().evaluations());
}

#[test]
fn test_evaluation_log_follows_config() {
    let table = synthetic::linear_table(50, 21, NOISE_STD).unwrap();
    let logged = BaselinePipeline::new(synthetic::linear_config())
        .unwrap()
        .run(&table)
        .unwrap();
    let config = SearchConfig {
        record_evaluations: false,
        ..synthetic::linear_config()
    };
    let unlogged = BaselinePipeline::new(config).unwrap().run(&table).unwrap();

    assert!(!SearchConfig::default().record_evaluations);
    assert_eq!(logged.search().evaluations().len(), 7);
    assert!(unlogged.search().evaluations().is_empty());
    assert_eq!(unlogged.report(), logged.report());
}
