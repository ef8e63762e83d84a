//! Survival prediction pipeline entry point

use clap::Parser;
use lifeboat::cli::{cmd_info, cmd_predict, Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lifeboat=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Predict {
            train,
            test,
            output,
            top_n,
            cv_folds,
            seed,
            fast,
        } => cmd_predict(&train, &test, &output, top_n, cv_folds, seed, fast),
        Commands::Info { data } => cmd_info(&data),
    }
}
