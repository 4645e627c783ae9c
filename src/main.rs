//! purifai - Main entry point
//!
//! Command-line driver for the tabular cleaning pipeline.

use clap::Parser;
use purifai::cli::{cmd_clean, cmd_info, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "purifai=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Clean {
            data,
            output,
            qc,
            outlier_method,
            imputation_method,
        } => {
            cmd_clean(&data, &output, qc.as_ref(), &outlier_method, &imputation_method)?;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
    }

    Ok(())
}
