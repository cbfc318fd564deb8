//! Alarm-to-evidence pipeline.
//!
//! Sequences parsing, query resolution, query execution and publishing for
//! a single alarm notification. Only an `ALARM` transition with a registered
//! query reaches the log-query service; everything else completes as a
//! no-op.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::{EvidenceSink, LogQueryService};
use crate::config::Config;
use crate::domain::{parse_payload, AlarmEvent, Payload};

use super::error::AlarmError;
use super::publisher::EvidencePublisher;
use super::resolver::{lookup_key, QueryResolver};
use super::runner::QueryRunner;

/// How a successful run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Evidence was uploaded
    Published { filename: String, lines: usize },
    /// The alarm left or never entered `ALARM`
    SkippedNotAlarm { state: String },
    /// No saved query is registered for the alarm
    NoQueryDefinition { lookup_key: String },
}

/// Main pipeline, generic over its two collaborators
pub struct Pipeline<L, S> {
    config: Config,
    logs: L,
    sink: S,
}

impl<L, S> Pipeline<L, S>
where
    L: LogQueryService,
    S: EvidenceSink,
{
    pub fn new(config: Config, logs: L, sink: S) -> Self {
        Self { config, logs, sink }
    }

    pub fn logs(&self) -> &L {
        &self.logs
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Process one alarm notification
    #[instrument(skip_all, fields(run_id = %Uuid::new_v4()))]
    pub async fn process(
        &self,
        payload: &Payload,
        cancel: &CancellationToken,
    ) -> Result<Outcome, AlarmError> {
        let event = match parse_payload(payload) {
            Ok(event) => event,
            Err(e) => {
                let err = AlarmError::from(e);
                error!(
                    alarm_arn = %payload.alarm_arn,
                    alarm_name = %payload.alarm_data.alarm_name,
                    alarm_state = %payload.alarm_data.state.value,
                    stage = %err.stage(),
                    error = %err,
                    "failed to process"
                );
                return Err(err);
            }
        };

        info!(
            alarm_name = %event.alarm_name,
            alarm_state = %event.state_value,
            "starting process"
        );

        if !event.is_alarming() {
            info!(
                alarm_name = %event.alarm_name,
                alarm_state = %event.state_value,
                "state is not ALARM, skip"
            );
            return Ok(Outcome::SkippedNotAlarm {
                state: event.state_value,
            });
        }

        let result = self.collect_evidence(&event, cancel).await;
        if let Err(ref err) = result {
            if err.is_retryable() {
                warn!(
                    alarm_name = %event.alarm_name,
                    alarm_state = %event.state_value,
                    stage = %err.stage(),
                    "no results found"
                );
            } else {
                error!(
                    alarm_name = %event.alarm_name,
                    alarm_state = %event.state_value,
                    stage = %err.stage(),
                    error = %err,
                    "failed to process"
                );
            }
        }
        result
    }

    /// Resolve, run and publish for an alarming event
    async fn collect_evidence(
        &self,
        event: &AlarmEvent,
        cancel: &CancellationToken,
    ) -> Result<Outcome, AlarmError> {
        let resolver = QueryResolver::new(&self.logs, &self.config.query_name_prefix);
        let definition = match resolver.resolve(&event.alarm_name, cancel).await? {
            Some(definition) => definition,
            None => {
                info!(alarm_name = %event.alarm_name, "query definition not found, skip");
                return Ok(Outcome::NoQueryDefinition {
                    lookup_key: lookup_key(&self.config.query_name_prefix, &event.alarm_name),
                });
            }
        };
        info!(
            query_definition_id = %definition.id,
            query_name = %definition.name,
            "found query definition"
        );

        let runner = QueryRunner::new(&self.logs, self.config.runner);
        let lines = runner.run(&definition, cancel).await?;
        if lines.is_empty() {
            return Err(AlarmError::NoResults {
                alarm_name: event.alarm_name.clone(),
            });
        }

        for line in &lines {
            info!(record = %line, "result");
        }

        let publisher = EvidencePublisher::new(&self.sink, &self.config.slack_channel);
        let bundle = publisher.publish(&definition.name, &lines, cancel).await?;

        Ok(Outcome::Published {
            filename: bundle.filename,
            lines: lines.len(),
        })
    }
}
