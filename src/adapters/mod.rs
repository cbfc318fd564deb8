//! Adapter interfaces for external systems.
//!
//! The pipeline only needs two collaborators: a log-query service that can
//! find and run saved queries, and a chat service that can take a file
//! upload. Production adapters wrap CloudWatch Logs and Slack; tests supply
//! in-memory fakes.

pub mod cloudwatch;
pub mod slack;
pub mod ssm;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{QueryDefinition, QueryPoll, QueryWindow};

// Re-export the production adapters
pub use cloudwatch::CloudWatchLogs;
pub use slack::SlackClient;

/// Saved-query discovery and execution
#[async_trait]
pub trait LogQueryService: Send + Sync {
    /// All query definitions whose name starts with `prefix`
    async fn list_query_definitions(&self, prefix: &str) -> Result<Vec<QueryDefinition>>;

    /// Start `definition` over `window`, returning the execution id
    async fn start_query(&self, definition: &QueryDefinition, window: QueryWindow)
        -> Result<String>;

    /// Current status, and rows once complete
    async fn get_query_results(&self, query_id: &str) -> Result<QueryPoll>;
}

/// Destination for evidence attachments
#[async_trait]
pub trait EvidenceSink: Send + Sync {
    /// Upload `content` as a text file named `filename` into `channel_id`
    async fn upload(&self, channel_id: &str, filename: &str, content: &str) -> Result<()>;
}
