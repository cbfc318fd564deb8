//! Query execution: submit, poll until terminal, collect `@message` lines.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::adapters::LogQueryService;
use crate::domain::{QueryDefinition, QueryPoll, QueryStatus, QueryWindow};

use super::cancel::cancellable;
use super::error::RunnerError;

/// How far back to query and how to wait for the result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerSettings {
    /// Length of the queried time window, ending now
    pub window: Duration,
    /// Delay before each status poll
    pub poll_interval: Duration,
    /// Give up once polling has taken this long
    pub max_wait: Duration,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(10 * 60),
            poll_interval: Duration::from_secs(1),
            max_wait: Duration::from_secs(5 * 60),
        }
    }
}

pub struct QueryRunner<'a, L: ?Sized> {
    service: &'a L,
    settings: RunnerSettings,
}

impl<'a, L: LogQueryService + ?Sized> QueryRunner<'a, L> {
    pub fn new(service: &'a L, settings: RunnerSettings) -> Self {
        Self { service, settings }
    }

    /// Run `definition` over the configured window ending now
    pub async fn run(
        &self,
        definition: &QueryDefinition,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, RunnerError> {
        self.run_window(definition, QueryWindow::ending_now(self.settings.window), cancel)
            .await
    }

    /// Run `definition` over an explicit window
    #[instrument(skip_all, fields(query_name = %definition.name))]
    pub async fn run_window(
        &self,
        definition: &QueryDefinition,
        window: QueryWindow,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, RunnerError> {
        info!(
            query_string = %definition.query_string,
            start = %window.start,
            end = %window.end,
            "executing query"
        );

        let query_id = cancellable(cancel, self.service.start_query(definition, window))
            .await
            .map_err(|_| RunnerError::Cancelled)?
            .map_err(RunnerError::Start)?;
        info!(%query_id, "query started");

        self.wait_for_results(&query_id, cancel).await
    }

    /// Poll `query_id` until it reaches a terminal status
    async fn wait_for_results(
        &self,
        query_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, RunnerError> {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            cancellable(cancel, tokio::time::sleep(self.settings.poll_interval))
                .await
                .map_err(|_| RunnerError::Cancelled)?;
            attempts += 1;

            let poll = cancellable(cancel, self.service.get_query_results(query_id))
                .await
                .map_err(|_| RunnerError::Cancelled)?
                .map_err(|source| RunnerError::Poll {
                    query_id: query_id.to_string(),
                    source,
                })?;

            match &poll.status {
                QueryStatus::Complete => return Ok(completed(query_id, &poll)),
                status if status.is_pending() => {
                    debug!(query_id, %status, attempts, "query running...");
                }
                status if status.is_failure() => {
                    return Err(RunnerError::Terminal {
                        query_id: query_id.to_string(),
                        status: status.clone(),
                    });
                }
                status => {
                    return Err(RunnerError::UnexpectedStatus {
                        query_id: query_id.to_string(),
                        status: status.clone(),
                    });
                }
            }

            let waited = started.elapsed();
            if waited >= self.settings.max_wait {
                return Err(RunnerError::PollTimeout {
                    query_id: query_id.to_string(),
                    waited,
                    attempts,
                });
            }
        }
    }
}

fn completed(query_id: &str, poll: &QueryPoll) -> Vec<String> {
    let messages = poll.messages();
    let stats = poll.statistics.unwrap_or_default();
    info!(
        query_id,
        rows = messages.len(),
        records_matched = stats.records_matched,
        records_scanned = stats.records_scanned,
        bytes_scanned = stats.bytes_scanned,
        "query completed"
    );
    messages
}
