//! alarmsight - CloudWatch alarm evidence collector
//!
//! When a CloudWatch alarm enters `ALARM`, runs the Logs Insights query
//! registered for it and posts the matching log lines to Slack as a file.
//!
//! # Architecture
//!
//! One invocation is one pass through a fixed pipeline:
//! - Parse and validate the alarm notification
//! - Skip anything that is not an `ALARM` transition
//! - Find the saved query named `<prefix><alarm name>`
//! - Run it over the recent window, polling until it finishes
//! - Upload the `@message` lines as `<query name>-<timestamp>.txt`
//!
//! A missing query or a non-alarm state completes without doing anything.
//! A query that matches nothing fails with a retryable error so the invoker
//! tries again once the logs have arrived.
//!
//! # Modules
//!
//! - `adapters`: External system integrations (CloudWatch Logs, Slack, SSM)
//! - `core`: Pipeline stages and their errors
//! - `domain`: Data structures (Payload, QueryDefinition, EvidenceBundle)
//! - `cli`: Command-line and Lambda entry points
//!
//! # Usage
//!
//! ```bash
//! # Process one event locally
//! SLACK_TOKEN=xoxb-... SLACK_CHANNEL=C0123 alarmsight --payload event.json
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::config::Config;
pub use crate::core::{AlarmError, Outcome, Pipeline};
pub use crate::domain::{AlarmEvent, Payload, QueryDefinition, QueryStatus};

// Production collaborators
pub use crate::adapters::{CloudWatchLogs, SlackClient};
