//! Runtime configuration for alarmsight.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags
//! 2. Environment variables (SLACK_TOKEN, SLACK_CHANNEL, QUERY_DURATION, ...)
//! 3. Defaults
//!
//! When `SSM_PATH` is set, Parameter Store values are exported into the
//! environment before any of this is read. The resulting [`Config`] is built
//! once at startup and handed to the pipeline; nothing here is global.

use std::fmt;
use std::time::Duration;

use crate::core::RunnerSettings;

pub const DEFAULT_QUERY_NAME_PREFIX: &str = "alarmsight_";
pub const DEFAULT_QUERY_DURATION: &str = "10m";
pub const DEFAULT_POLL_INTERVAL: &str = "1s";
pub const DEFAULT_QUERY_TIMEOUT: &str = "5m";

/// Resolved configuration for one process
#[derive(Clone)]
pub struct Config {
    /// Slack token used for uploads
    pub slack_token: String,
    /// Slack channel id that receives the evidence
    pub slack_channel: String,
    /// Saved queries are named `<prefix><alarm name>`
    pub query_name_prefix: String,
    /// Query window and polling behavior
    pub runner: RunnerSettings,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("slack_token", &"<redacted>")
            .field("slack_channel", &self.slack_channel)
            .field("query_name_prefix", &self.query_name_prefix)
            .field("runner", &self.runner)
            .finish()
    }
}

/// Parse a duration such as `500ms`, `90s`, `10m`, `1.5h` or `1h30m`.
///
/// Accepted units: `ns`, `us`, `µs`, `ms`, `s`, `m`, `h`. A unit is required
/// on every component.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }

    let mut total_nanos: f64 = 0.0;
    let mut rest = s;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration '{}'", input))?;
        if number_len == 0 {
            return Err(format!("invalid duration '{}'", input));
        }
        let value: f64 = rest[..number_len]
            .parse()
            .map_err(|_| format!("invalid number in duration '{}'", input))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            other => return Err(format!("unknown unit '{}' in duration '{}'", other, input)),
        };
        rest = &rest[unit_len..];

        total_nanos += value * nanos_per_unit;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(format!("duration '{}' is out of range", input));
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

/// Like [`parse_duration`], rejecting zero
pub fn parse_positive_duration(input: &str) -> Result<Duration, String> {
    let duration = parse_duration(input)?;
    if duration.is_zero() {
        return Err(format!("duration '{}' must be greater than zero", input));
    }
    Ok(duration)
}
