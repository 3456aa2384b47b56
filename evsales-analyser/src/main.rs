//! EV sales analyser CLI
//!
//! Cleans raw exports, summarises cleaned datasets and reports the held-out
//! quality of the sales regressor along with the per-manufacturer forecast.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use evsales_analyser::cleaner::clean;
use evsales_analyser::dataset::{prepare, read_raw, write_records};
use evsales_analyser::describe::describe;
use evsales_analyser::encoder::CategoricalEncoding;
use evsales_analyser::features::derive_features;
use evsales_analyser::forecast::{forecast, ForecastWindow, ManufacturerMetric};
use evsales_analyser::random_forest::RandomForestBuilder;
use evsales_analyser::trainer::{holdout_forest, train_with_holdout, FeatureFrame, RANDOM_SEED, TEST_RATE};

#[derive(Parser)]
#[command(name = "evsales")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Electric vehicle sales cleaning, training and forecasting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a raw dataset and write the result as CSV
    Clean {
        /// Raw dataset file
        input: PathBuf,

        /// Cleaned output file
        output: PathBuf,
    },

    /// Train on a cleaned dataset and report held-out accuracy and the forecast
    Train {
        /// Cleaned dataset file
        dataset: PathBuf,

        /// Write the fitted categorical encoding as JSON
        #[arg(long)]
        encoding_out: Option<PathBuf>,

        /// Number of trees
        #[arg(long)]
        trees: Option<NonZeroUsize>,

        /// Seed for the split and the forest
        #[arg(long, default_value_t = RANDOM_SEED)]
        seed: u64,
    },

    /// Print summary statistics of a cleaned dataset
    Describe {
        /// Cleaned dataset file
        dataset: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evsales_analyser=info,evsales=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Clean { input, output } => cmd_clean(&input, &output),
        Commands::Train { dataset, encoding_out, trees, seed } => {
            cmd_train(&dataset, encoding_out.as_deref(), trees, seed)
        }
        Commands::Describe { dataset } => cmd_describe(&dataset),
    }
}

fn cmd_clean(input: &Path, output: &Path) -> anyhow::Result<()> {
    let raw = read_raw(input).with_context(|| format!("reading {}", input.display()))?;
    let (records, report) = clean(raw)?;
    write_records(output, &records).with_context(|| format!("writing {}", output.display()))?;

    println!("Input rows:          {}", report.input_rows);
    println!("Duplicates removed:  {}", report.duplicates_removed);
    for (column, count) in report.imputed.numeric.iter().chain(&report.imputed.categorical) {
        if *count > 0 {
            println!("Imputed {column}: {count}");
        }
    }
    println!("Invalid rows removed: {}", report.invalid_removed);
    println!("Emissions clipped:   {}", report.emissions_clipped);
    println!("Output rows:         {}", report.output_rows);
    println!("Cleaned dataset written to {}", output.display());

    Ok(())
}

fn cmd_train(dataset: &Path, encoding_out: Option<&Path>, trees: Option<NonZeroUsize>, seed: u64) -> anyhow::Result<()> {
    let mut records = prepare(read_raw(dataset).with_context(|| format!("reading {}", dataset.display()))?)?;
    derive_features(&mut records);

    let encoding = CategoricalEncoding::fit(&records);
    if let Some(path) = encoding_out {
        encoding.save(path)?;
        println!("Encoding written to {}", path.display());
    }

    let frame = FeatureFrame::build(&records, &encoding)?;
    let defaults = holdout_forest();
    let forest = RandomForestBuilder {
        trees: trees.unwrap_or(defaults.trees),
        seed: Some(seed),
        ..defaults
    };

    let (model, evaluation) = train_with_holdout(&frame, &forest, TEST_RATE, seed)?;
    println!("MAE : {:.2}", evaluation.mae);
    println!("R²  : {:.2}", evaluation.r2);

    let metrics = forecast(&model, &frame, &records, &ForecastWindow::default());
    print_metrics(&metrics);

    Ok(())
}

fn cmd_describe(dataset: &Path) -> anyhow::Result<()> {
    let mut records = prepare(read_raw(dataset).with_context(|| format!("reading {}", dataset.display()))?)?;
    derive_features(&mut records);

    print!("{}", describe(&records));

    Ok(())
}

fn print_metrics(metrics: &[ManufacturerMetric]) {
    println!();
    println!(
        "{:<24} {:>14} {:>14} {:>14} {:>10}",
        "Manufacturer", "Avg_2015_25", "Predicted_2026", "Change", "Change_%"
    );
    for m in metrics {
        println!(
            "{:<24} {:>14.2} {:>14.2} {:>14.2} {:>10.2}",
            m.manufacturer, m.historical_average, m.predicted_average, m.change, m.change_pct
        );
    }
}
