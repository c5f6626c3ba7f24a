//! Property Estimator - Main Entry Point
//!
//! Trains the price model, predicts from CSV files, or runs the web service.

use clap::Parser;
use property_estimator::cli::{cmd_predict, cmd_serve, cmd_train, training_config, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "property_estimator=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, output, n_estimators, seed, max_depth, max_features } => {
            let config = training_config(n_estimators, seed, max_depth, &max_features)?;
            cmd_train(&data, &output, config)?;
        }
        Commands::Predict { model, data, output } => {
            cmd_predict(&model, &data, output.as_deref())?;
        }
        Commands::Serve { port, host, model, store } => {
            cmd_serve(host, port, model, store).await?;
        }
    }

    Ok(())
}
