//! Error taxonomy for one pipeline run.
//!
//! Each stage has its own error type; [`AlarmError`] is what the pipeline
//! returns to the invoker. Only [`AlarmError::NoResults`] asks for a retry.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{ParseError, QueryStatus};

/// Pipeline stage, used in logs and errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Parse,
    Resolve,
    Run,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Parse => "parse",
            Self::Resolve => "resolve",
            Self::Run => "run",
            Self::Publish => "publish",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to find query definition with prefix '{lookup_key}': {source:#}")]
    Lookup {
        lookup_key: String,
        source: anyhow::Error,
    },

    #[error("query definition lookup cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to start query: {0:#}")]
    Start(#[source] anyhow::Error),

    #[error("failed to get query results for {query_id}: {source:#}")]
    Poll {
        query_id: String,
        source: anyhow::Error,
    },

    #[error("query {query_id} failed: {status}")]
    Terminal { query_id: String, status: QueryStatus },

    #[error("unexpected query status for {query_id}: {status}")]
    UnexpectedStatus { query_id: String, status: QueryStatus },

    #[error("query {query_id} did not complete within {waited:?} ({attempts} polls)")]
    PollTimeout {
        query_id: String,
        waited: Duration,
        attempts: u32,
    },

    #[error("query execution cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to upload {filename} to channel {channel_id}: {source:#}")]
    Upload {
        channel_id: String,
        filename: String,
        source: anyhow::Error,
    },

    #[error("evidence upload cancelled")]
    Cancelled,
}

/// Why a run failed
#[derive(Debug, Error)]
pub enum AlarmError {
    #[error("failed to parse payload: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(ResolveError),

    #[error(transparent)]
    Run(RunnerError),

    #[error("no results found for alarm {alarm_name}, retrying")]
    NoResults { alarm_name: String },

    #[error(transparent)]
    Publish(PublishError),

    #[error("cancelled during {stage} stage")]
    Cancelled { stage: Stage },
}

impl AlarmError {
    /// True when the invoker should run the whole invocation again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NoResults { .. })
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::Parse(_) => Stage::Parse,
            Self::Resolve(_) => Stage::Resolve,
            Self::Run(_) | Self::NoResults { .. } => Stage::Run,
            Self::Publish(_) => Stage::Publish,
            Self::Cancelled { stage } => *stage,
        }
    }

    /// Terminal query status carried by the error, if any
    pub fn query_status(&self) -> Option<&QueryStatus> {
        match self {
            Self::Run(RunnerError::Terminal { status, .. })
            | Self::Run(RunnerError::UnexpectedStatus { status, .. }) => Some(status),
            _ => None,
        }
    }
}

impl From<ResolveError> for AlarmError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::Cancelled => Self::Cancelled { stage: Stage::Resolve },
            e => Self::Resolve(e),
        }
    }
}

impl From<RunnerError> for AlarmError {
    fn from(e: RunnerError) -> Self {
        match e {
            RunnerError::Cancelled => Self::Cancelled { stage: Stage::Run },
            e => Self::Run(e),
        }
    }
}

impl From<PublishError> for AlarmError {
    fn from(e: PublishError) -> Self {
        match e {
            PublishError::Cancelled => Self::Cancelled { stage: Stage::Publish },
            e => Self::Publish(e),
        }
    }
}
