//! Logs Insights query definitions and executions.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Field carrying the raw log line in every result row
pub const MESSAGE_FIELD: &str = "@message";

/// A saved query, owned by the log-query service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDefinition {
    pub id: String,
    pub name: String,
    pub query_string: String,
    pub log_group_names: Vec<String>,
}

/// Status of a running query execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryStatus {
    Scheduled,
    Running,
    Complete,
    Failed,
    Cancelled,
    Timeout,
    /// Anything the service reports that we do not model, including `Unknown`
    Unknown(String),
}

impl QueryStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Scheduled" => Self::Scheduled,
            "Running" => Self::Running,
            "Complete" => Self::Complete,
            "Failed" => Self::Failed,
            "Cancelled" => Self::Cancelled,
            "Timeout" => Self::Timeout,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Still waiting for the service to finish
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Running)
    }

    /// Terminal states that mean the query itself failed
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled | Self::Timeout)
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Scheduled => "Scheduled",
            Self::Running => "Running",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
            Self::Timeout => "Timeout",
            Self::Unknown(raw) => raw.as_str(),
        };
        f.write_str(s)
    }
}

/// One `field = value` cell of a result row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultField {
    pub field: String,
    pub value: String,
}

impl ResultField {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Scan statistics reported alongside completed results
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryStatistics {
    pub records_matched: f64,
    pub records_scanned: f64,
    pub bytes_scanned: f64,
}

/// Snapshot returned by one status poll
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPoll {
    pub status: QueryStatus,
    pub rows: Vec<Vec<ResultField>>,
    pub statistics: Option<QueryStatistics>,
}

impl QueryPoll {
    pub fn pending(status: QueryStatus) -> Self {
        Self {
            status,
            rows: Vec::new(),
            statistics: None,
        }
    }

    /// The `@message` value of every row, in service order
    pub fn messages(&self) -> Vec<String> {
        self.rows
            .iter()
            .flat_map(|row| row.iter())
            .filter(|cell| cell.field == MESSAGE_FIELD)
            .map(|cell| cell.value.clone())
            .collect()
    }
}

/// Time range a query covers, at whole-second precision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl QueryWindow {
    /// Window of `duration` ending now
    pub fn ending_now(duration: Duration) -> Self {
        Self::ending_at(Utc::now(), duration)
    }

    /// Window of `duration` ending at `end`; both bounds truncated to seconds
    pub fn ending_at(end: DateTime<Utc>, duration: Duration) -> Self {
        let end = truncate_to_second(end);
        let start = TimeDelta::from_std(duration)
            .ok()
            .and_then(|span| end.checked_sub_signed(span))
            .map(truncate_to_second)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self { start, end }
    }

    pub fn start_epoch(&self) -> i64 {
        self.start.timestamp()
    }

    pub fn end_epoch(&self) -> i64 {
        self.end.timestamp()
    }
}

fn truncate_to_second(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(TimeDelta::seconds(1)).unwrap_or(t)
}
