//! Command-line interface for alarmsight.
//!
//! The same binary serves Lambda invocations when started by the Lambda
//! runtime, and otherwise processes a single alarm payload read from a file
//! or stdin.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::adapters::{CloudWatchLogs, EvidenceSink, LogQueryService, SlackClient};
use crate::config::{
    parse_positive_duration, Config, DEFAULT_POLL_INTERVAL, DEFAULT_QUERY_DURATION,
    DEFAULT_QUERY_NAME_PREFIX, DEFAULT_QUERY_TIMEOUT,
};
use crate::core::{Pipeline, RunnerSettings};
use crate::domain::Payload;

pub mod lambda;

/// alarmsight - post CloudWatch Logs Insights results to Slack when an alarm fires
#[derive(Parser)]
#[command(name = "alarmsight")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Slack token
    #[arg(long, env = "SLACK_TOKEN", hide_env_values = true)]
    pub slack_token: String,

    /// Slack channel ID
    #[arg(long, env = "SLACK_CHANNEL")]
    pub slack_channel: String,

    /// Duration of query
    #[arg(long, env = "QUERY_DURATION", default_value = DEFAULT_QUERY_DURATION, value_parser = parse_positive_duration)]
    pub query_duration: Duration,

    /// Saved queries are looked up as <prefix><alarm name>
    #[arg(long, env = "QUERY_NAME_PREFIX", default_value = DEFAULT_QUERY_NAME_PREFIX)]
    pub query_name_prefix: String,

    /// Delay between query status polls
    #[arg(long, env = "QUERY_POLL_INTERVAL", default_value = DEFAULT_POLL_INTERVAL, value_parser = parse_positive_duration)]
    pub poll_interval: Duration,

    /// Give up waiting for a query after this long
    #[arg(long, env = "QUERY_TIMEOUT", default_value = DEFAULT_QUERY_TIMEOUT, value_parser = parse_positive_duration)]
    pub query_timeout: Duration,

    /// Alarm payload file for local runs (reads stdin if not provided)
    #[arg(long)]
    pub payload: Option<PathBuf>,
}

impl Cli {
    /// Build the process configuration from parsed arguments
    pub fn to_config(&self) -> Config {
        Config {
            slack_token: self.slack_token.clone(),
            slack_channel: self.slack_channel.clone(),
            query_name_prefix: self.query_name_prefix.clone(),
            runner: RunnerSettings {
                window: self.query_duration,
                poll_interval: self.poll_interval,
                max_wait: self.query_timeout,
            },
        }
    }

    /// Execute in Lambda or local mode
    pub async fn execute(self) -> Result<()> {
        let config = self.to_config();
        let aws = aws_config::load_from_env().await;
        let logs = CloudWatchLogs::new(&aws);
        let slack = SlackClient::new(config.slack_token.clone());
        let pipeline = Pipeline::new(config, logs, slack);

        if lambda::is_lambda_environment() {
            lambda::serve(&pipeline).await
        } else {
            run_local(&pipeline, self.payload).await
        }
    }
}

/// Process one payload outside Lambda
async fn run_local<L, S>(pipeline: &Pipeline<L, S>, payload_file: Option<PathBuf>) -> Result<()>
where
    L: LogQueryService,
    S: EvidenceSink,
{
    let raw = match payload_file {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read payload file: {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("Failed to read payload from stdin")?;
            buffer
        }
    };

    let payload: Payload = serde_json::from_str(&raw).context("Failed to parse alarm payload")?;

    // Ctrl-C stops whatever call is in flight
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupted, cancelling");
                cancel.cancel();
            }
        })
    };

    let result = pipeline.process(&payload, &cancel).await;
    interrupt.abort();

    let outcome = result?;
    println!("{}", serde_json::to_string(&outcome)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from([
            "alarmsight",
            "--slack-token",
            "xoxb-1",
            "--slack-channel",
            "C123",
        ])
        .unwrap();
        let config = cli.to_config();

        assert_eq!(config.slack_channel, "C123");
        assert_eq!(config.query_name_prefix, "alarmsight_");
        assert_eq!(config.runner.window, Duration::from_secs(600));
        assert_eq!(config.runner.poll_interval, Duration::from_secs(1));
        assert_eq!(config.runner.max_wait, Duration::from_secs(300));
        assert!(cli.payload.is_none());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "alarmsight",
            "--slack-token",
            "t",
            "--slack-channel",
            "C",
            "--query-duration",
            "1h30m",
            "--query-name-prefix",
            "ops_",
            "--poll-interval",
            "250ms",
            "--payload",
            "event.json",
        ])
        .unwrap();
        let config = cli.to_config();

        assert_eq!(config.runner.window, Duration::from_secs(5400));
        assert_eq!(config.runner.poll_interval, Duration::from_millis(250));
        assert_eq!(config.query_name_prefix, "ops_");
        assert_eq!(cli.payload, Some(PathBuf::from("event.json")));
    }

    #[test]
    fn test_rejects_zero_duration() {
        let result = Cli::try_parse_from([
            "alarmsight",
            "--slack-token",
            "t",
            "--slack-channel",
            "C",
            "--query-duration",
            "0s",
        ]);
        assert!(result.is_err());
    }
}
