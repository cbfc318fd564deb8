//! Lambda runtime integration.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use lambda_runtime::{service_fn, LambdaEvent};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::adapters::{EvidenceSink, LogQueryService};
use crate::core::{cancel_after, Outcome, Pipeline};
use crate::domain::Payload;

/// Set by the Lambda execution environment
pub const RUNTIME_API_VAR: &str = "AWS_LAMBDA_RUNTIME_API";

/// Headroom left before the invocation deadline to report cancellation
const DEADLINE_MARGIN: Duration = Duration::from_millis(500);

pub fn is_lambda_environment() -> bool {
    std::env::var_os(RUNTIME_API_VAR).is_some()
}

/// Time left until `deadline_ms` (epoch milliseconds), minus the margin
pub fn time_left(deadline_ms: u64, now_ms: u64) -> Duration {
    Duration::from_millis(deadline_ms.saturating_sub(now_ms)).saturating_sub(DEADLINE_MARGIN)
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Serve invocations until the runtime shuts down
pub async fn serve<L, S>(pipeline: &Pipeline<L, S>) -> Result<()>
where
    L: LogQueryService,
    S: EvidenceSink,
{
    lambda_runtime::run(service_fn(|event: LambdaEvent<Payload>| handle(pipeline, event)))
        .await
        .map_err(|e| anyhow::anyhow!(e))
}

async fn handle<L, S>(
    pipeline: &Pipeline<L, S>,
    event: LambdaEvent<Payload>,
) -> Result<Outcome, lambda_runtime::Error>
where
    L: LogQueryService,
    S: EvidenceSink,
{
    let LambdaEvent { payload, context } = event;
    info!(request_id = %context.request_id, "invocation received");

    let cancel = CancellationToken::new();
    let timer = cancel_after(&cancel, time_left(context.deadline, now_epoch_ms()));

    let result = pipeline.process(&payload, &cancel).await;
    timer.abort();

    Ok(result?)
}
