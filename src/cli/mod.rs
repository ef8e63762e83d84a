//! Command-line interface

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data;
use crate::ensemble::EnsembleGrids;
use crate::pipeline::{self, PipelineConfig, PipelineParams};

#[derive(Parser)]
#[command(name = "lifeboat")]
#[command(about = "Passenger survival prediction pipeline", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline and write a prediction file
    Predict {
        /// Training data CSV (with the Survived column)
        #[arg(long)]
        train: PathBuf,

        /// Test data CSV (without the Survived column)
        #[arg(long)]
        test: PathBuf,

        /// Output CSV path
        #[arg(long, default_value = "submission.csv")]
        output: PathBuf,

        /// Number of features kept after importance ranking
        #[arg(long, default_value_t = 100)]
        top_n: usize,

        /// Cross-validation folds for every grid search
        #[arg(long, default_value_t = 10)]
        cv_folds: usize,

        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Use the small hyperparameter grids for a quick run
        #[arg(long)]
        fast: bool,
    },

    /// Print basic information about a dataset
    Info {
        /// CSV file to inspect
        data: PathBuf,
    },
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_predict(
    train: &Path,
    test: &Path,
    output: &Path,
    top_n: usize,
    cv_folds: usize,
    seed: u64,
    fast: bool,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let config = PipelineConfig {
        train_path: train.to_path_buf(),
        test_path: test.to_path_buf(),
        output_path: output.to_path_buf(),
        params: PipelineParams {
            top_n,
            cv_folds,
            seed,
            grids: if fast {
                EnsembleGrids::compact()
            } else {
                EnsembleGrids::default()
            },
        },
    };

    pipeline::run(&config)?;
    println!(
        "Predictions written to {} in {:.1}s",
        output.display(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

pub fn cmd_info(path: &Path) -> anyhow::Result<()> {
    let df = data::load_csv(path)?;
    println!("{}", path.display());
    println!("  rows:    {}", df.height());
    println!("  columns: {}", df.width());
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        println!(
            "  {:<24} {:<10} {} nulls",
            series.name(),
            format!("{}", series.dtype()),
            series.null_count()
        );
    }
    Ok(())
}
