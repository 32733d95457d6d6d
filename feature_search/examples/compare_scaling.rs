use feature_search::{compare_strategies, synthetic};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Feature Search: Scaling Strategy Comparison");
    println!("===========================================\n");

    // "proxy" is an exact linear function of the price; the other columns are noise
    let table = synthetic::proxy_table(200, 7)?;
    let config = synthetic::proxy_config();

    let comparison = compare_strategies(&config, &table)?;
    println!("{}\n", comparison);

    if comparison.agree() {
        println!("Scaling does not change which features matter for this linear baseline.");
    }

    println!("\nJSON:\n{}", comparison.to_json()?);

    Ok(())
}
