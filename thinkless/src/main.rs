mod config;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Capture ingestion service: accepts JSON captures over HTTP and files them
/// as issues in the configured tracker.
#[derive(Parser)]
#[command(name = "thinkless")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match config::Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %cli.config.display(), error = %e, "failed to load config");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = config.ingest.validate() {
        tracing::error!(error = %e, "invalid config");
        return ExitCode::FAILURE;
    }

    if let Err(e) = capture_ingest::run(config.ingest).await {
        tracing::error!(error = %e, "ingest service failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
