//! alarmsight entrypoint

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use alarmsight::adapters::ssm;
use alarmsight::cli::{lambda, Cli};

fn main() -> Result<()> {
    init_tracing();

    // Parameter Store values must be in the environment before flags are
    // parsed, and set_var must run before any worker thread exists
    if let Ok(path) = std::env::var("SSM_PATH") {
        if !path.is_empty() {
            info!(path = %path, "exporting SSM parameters");
            let parameters = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to build SSM runtime")?
                .block_on(async {
                    let aws = aws_config::load_from_env().await;
                    ssm::load_parameters(&aws, &path).await
                })
                .context("Failed to export SSM parameters")?;
            ssm::export_to_env(parameters);
        }
    }

    let cli = Cli::parse();
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?
        .block_on(cli.execute())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if lambda::is_lambda_environment() {
        // CloudWatch adds its own ingestion time
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .without_time(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }
}
