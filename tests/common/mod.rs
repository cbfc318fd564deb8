//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use alarmsight::adapters::{EvidenceSink, LogQueryService};
use alarmsight::config::Config;
use alarmsight::core::RunnerSettings;
use alarmsight::domain::{
    Payload, QueryDefinition, QueryPoll, QueryStatus, QueryWindow, ResultField,
};

pub const ALARM_ARN: &str =
    "arn:aws:cloudwatch:ap-northeast-1:123456789012:alarm:lambda-demo-metric-alarm";

/// Log-query service that serves canned definitions and poll responses
#[derive(Default)]
pub struct FakeLogs {
    definitions: Vec<QueryDefinition>,
    fail_list: bool,
    fail_start: bool,
    /// Consumed front to back; the last entry repeats forever
    polls: Mutex<VecDeque<QueryPoll>>,
    pub calls: Mutex<Vec<String>>,
    pub windows: Mutex<Vec<QueryWindow>>,
}

impl FakeLogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_definition(mut self, definition: QueryDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn with_polls(self, polls: Vec<QueryPoll>) -> Self {
        *self.polls.lock().unwrap() = polls.into();
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn poll_count(&self) -> usize {
        self.calls().iter().filter(|c| c.starts_with("poll:")).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl LogQueryService for FakeLogs {
    async fn list_query_definitions(&self, prefix: &str) -> Result<Vec<QueryDefinition>> {
        self.record(format!("list:{}", prefix));
        if self.fail_list {
            anyhow::bail!("AccessDeniedException: not authorized");
        }
        Ok(self
            .definitions
            .iter()
            .filter(|d| d.name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn start_query(
        &self,
        definition: &QueryDefinition,
        window: QueryWindow,
    ) -> Result<String> {
        self.record(format!("start:{}", definition.name));
        self.windows.lock().unwrap().push(window);
        if self.fail_start {
            anyhow::bail!("MalformedQueryException: unexpected symbol");
        }
        Ok("query-1".to_string())
    }

    async fn get_query_results(&self, query_id: &str) -> Result<QueryPoll> {
        self.record(format!("poll:{}", query_id));
        let mut polls = self.polls.lock().unwrap();
        let next = if polls.len() > 1 {
            polls.pop_front()
        } else {
            polls.front().cloned()
        };
        next.ok_or_else(|| anyhow::anyhow!("no poll response scripted"))
    }
}

/// Sink that records uploads instead of sending them
#[derive(Default)]
pub struct FakeSink {
    fail: bool,
    pub uploads: Mutex<Vec<(String, String, String)>>,
}

impl FakeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn uploads(&self) -> Vec<(String, String, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl EvidenceSink for FakeSink {
    async fn upload(&self, channel_id: &str, filename: &str, content: &str) -> Result<()> {
        if self.fail {
            anyhow::bail!("Slack API error from files.completeUploadExternal: not_in_channel");
        }
        self.uploads.lock().unwrap().push((
            channel_id.to_string(),
            filename.to_string(),
            content.to_string(),
        ));
        Ok(())
    }
}

pub fn definition(name: &str) -> QueryDefinition {
    QueryDefinition {
        id: format!("id-{}", name),
        name: name.to_string(),
        query_string: "fields @timestamp, @message | filter @message like /ERROR/".to_string(),
        log_group_names: vec!["/aws/lambda/lambda-demo".to_string()],
    }
}

pub fn running() -> QueryPoll {
    QueryPoll::pending(QueryStatus::Running)
}

pub fn status(status: QueryStatus) -> QueryPoll {
    QueryPoll::pending(status)
}

pub fn complete(messages: &[&str]) -> QueryPoll {
    QueryPoll {
        status: QueryStatus::Complete,
        rows: messages
            .iter()
            .map(|m| {
                vec![
                    ResultField::new("@timestamp", "2024-03-01 09:04:12.000"),
                    ResultField::new("@message", *m),
                ]
            })
            .collect(),
        statistics: None,
    }
}

pub fn fast_settings() -> RunnerSettings {
    RunnerSettings {
        window: Duration::from_secs(600),
        poll_interval: Duration::from_millis(1),
        max_wait: Duration::from_secs(5),
    }
}

pub fn config() -> Config {
    Config {
        slack_token: "xoxb-test".to_string(),
        slack_channel: "C0123".to_string(),
        query_name_prefix: "alarmsight_".to_string(),
        runner: fast_settings(),
    }
}

pub fn payload(alarm_name: &str, state: &str) -> Payload {
    let mut p = Payload {
        alarm_arn: ALARM_ARN.to_string(),
        ..Default::default()
    };
    p.alarm_data.alarm_name = alarm_name.to_string();
    p.alarm_data.state.value = state.to_string();
    p
}
