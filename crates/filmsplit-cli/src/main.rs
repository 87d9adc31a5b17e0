//! filmsplit CLI: run one frame-extraction job by hand.
//!
//! Configuration comes from the environment (and `.env`); see `filmsplit config`.

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use filmsplit_cli::EventSource;
use filmsplit_core::Config;
use filmsplit_infra::{init_telemetry, shutdown_telemetry};
use filmsplit_worker::{InvocationHandler, LoggingCompletion};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "filmsplit", about = "Split videos into one frame per second")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one uploaded video
    Invoke {
        /// Source bucket
        #[arg(long, requires = "key")]
        bucket: Option<String>,
        /// Object key, unencoded
        #[arg(long, requires = "bucket")]
        key: Option<String>,
        /// Notification JSON file, or `-` for stdin
        #[arg(long, conflicts_with_all = ["bucket", "key"])]
        event: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Commands::Config => {
            print_json(&config)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Invoke { bucket, key, event } => {
            init_telemetry(&config.telemetry)
                .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

            let payload = EventSource::from_args(bucket, key, event)?.load()?;
            let handler = InvocationHandler::from_config(&config).await?;

            let outcome = handler.handle(payload, Box::new(LoggingCompletion)).await;
            shutdown_telemetry();

            match outcome {
                Ok(report) => {
                    print_json(&report)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(_) => Ok(ExitCode::FAILURE),
            }
        }
    }
}
