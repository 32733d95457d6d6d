use feature_search::synthetic;
use feature_search::BaselinePipeline;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Feature Search: Basic Subset Search Example");
    println!("===========================================\n");

    // 52 weeks of price = 2 + 3 * feature1 - feature2 + noise
    let table = synthetic::linear_table(52, 42, 0.5)?;
    println!("Sample table created: {} weekly rows\n", table.len());

    let config = synthetic::linear_config();
    println!("Candidate features: {:?}", config.candidate_features);
    println!("Scaling: {}\n", config.scaling);

    let outcome = BaselinePipeline::new(config)?.run(&table)?;
    let (train, validation, test) = outcome.split().sizes();
    println!(
        "Split sizes after lagging: train {}, validation {}, test {}\n",
        train, validation, test
    );

    println!("Per-subset validation MSE:");
    for evaluation in outcome.search().evaluations() {
        match evaluation.mse {
            Some(mse) => println!("  {:<45} {:>12.6}", evaluation.features.join(" + "), mse),
            None => println!("  {:<45} failed", evaluation.features.join(" + ")),
        }
    }

    println!("\n{}", outcome.report());

    let fit = &outcome.search().best().fit;
    println!("\nIntercept: {:.4}", fit.intercept());
    println!("Coefficients: {:?}", fit.coefficients());

    Ok(())
}
