//! Baseline feature-subset search - command line entry point

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use feature_search::report::save_evaluations_csv;
use feature_search::source::{weekly_petroleum_table, write_table_csv};
use feature_search::{
    compare_strategies, synthetic, BaselinePipeline, DataLoader, ScalingStrategy, SearchConfig,
    TemporalTable,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "baseline_search")]
#[command(about = "Exhaustive feature-subset search for a baseline gasoline price model")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a clean merged table (first column holds dates)
    Search {
        /// Merged table CSV
        #[arg(short, long)]
        data: PathBuf,

        #[command(flatten)]
        options: SearchOptions,
    },

    /// Build the merged table from the weekly price, import and export downloads, then search
    Eia {
        /// Weekly retail gasoline price CSV
        #[arg(long)]
        gas: PathBuf,

        /// Weekly imports CSV
        #[arg(long)]
        imports: PathBuf,

        /// Weekly exports CSV
        #[arg(long)]
        exports: PathBuf,

        /// Also write the merged table to this CSV
        #[arg(long)]
        save_table: Option<PathBuf>,

        #[command(flatten)]
        options: SearchOptions,
    },

    /// Run the search with and without standardization and compare the winners
    Compare {
        /// Merged table CSV
        #[arg(short, long)]
        data: PathBuf,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the comparison as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search a seeded synthetic table
    Demo {
        /// Number of weekly rows
        #[arg(long, default_value = "20")]
        rows: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Standard deviation of the target noise
        #[arg(long, default_value = "0.5")]
        noise: f64,

        #[command(flatten)]
        options: SearchOptions,
    },
}

#[derive(Args)]
struct SearchOptions {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scaling strategy (identity, standardize); overrides the configuration
    #[arg(short, long)]
    scaling: Option<String>,

    /// Evaluate subsets in parallel
    #[arg(long)]
    parallel: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Write the per-subset evaluation log to this CSV
    #[arg(long)]
    evaluations: Option<PathBuf>,
}

impl SearchOptions {
    fn resolve(&self, base: SearchConfig) -> anyhow::Result<SearchConfig> {
        let mut config = match &self.config {
            Some(path) => SearchConfig::from_json_file(path)
                .with_context(|| format!("loading configuration {}", path.display()))?,
            None => base,
        };
        if let Some(scaling) = &self.scaling {
            config.scaling = scaling.parse::<ScalingStrategy>()?;
        }
        if self.parallel {
            config.parallel = true;
        }
        if self.evaluations.is_some() {
            config.record_evaluations = true;
        }
        Ok(config)
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SearchConfig> {
    match path {
        Some(path) => SearchConfig::from_json_file(path)
            .with_context(|| format!("loading configuration {}", path.display())),
        None => Ok(SearchConfig::default()),
    }
}

fn run_search(
    table: &TemporalTable,
    config: SearchConfig,
    options: &SearchOptions,
) -> anyhow::Result<()> {
    let outcome = BaselinePipeline::new(config)?.run(table)?;

    if let Some(path) = &options.evaluations {
        save_evaluations_csv(outcome.search().evaluations(), path)
            .with_context(|| format!("writing evaluations to {}", path.display()))?;
        info!(path = %path.display(), "wrote evaluation log");
    }

    if options.json {
        println!("{}", outcome.report().to_json()?);
    } else {
        println!("{}", outcome.report());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feature_search=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search { data, options } => {
            let config = options.resolve(SearchConfig::default())?;
            let table = DataLoader::table_from_csv(&data, &config.target_column)
                .with_context(|| format!("reading {}", data.display()))?;
            run_search(&table, config, &options)?;
        }
        Commands::Eia {
            gas,
            imports,
            exports,
            save_table,
            options,
        } => {
            let config = options.resolve(SearchConfig::default())?;
            let table = weekly_petroleum_table(
                &DataLoader::eia_weekly(&gas)
                    .with_context(|| format!("reading {}", gas.display()))?,
                &DataLoader::eia_weekly(&imports)
                    .with_context(|| format!("reading {}", imports.display()))?,
                &DataLoader::eia_weekly(&exports)
                    .with_context(|| format!("reading {}", exports.display()))?,
            )?;
            if let Some(path) = &save_table {
                write_table_csv(&table, path)?;
                info!(path = %path.display(), "wrote merged table");
            }
            run_search(&table, config, &options)?;
        }
        Commands::Compare { data, config, json } => {
            let config = load_config(config.as_ref())?;
            let table = DataLoader::table_from_csv(&data, &config.target_column)
                .with_context(|| format!("reading {}", data.display()))?;
            let comparison = compare_strategies(&config, &table)?;
            if json {
                println!("{}", comparison.to_json()?);
            } else {
                println!("{}", comparison);
            }
        }
        Commands::Demo {
            rows,
            seed,
            noise,
            options,
        } => {
            let config = options.resolve(synthetic::linear_config())?;
            let table = synthetic::linear_table(rows, seed, noise)?;
            run_search(&table, config, &options)?;
        }
    }

    Ok(())
}
