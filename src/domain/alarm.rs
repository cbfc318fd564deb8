//! CloudWatch alarm notifications and their validation.
//!
//! The inbound payload is the document CloudWatch hands to a Lambda alarm
//! action. Only the ARN, alarm name and state value are consumed; the rest is
//! kept for logging.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// State value that triggers a query run
pub const ALARM_STATE: &str = "ALARM";

/// Raw alarm notification as delivered by CloudWatch.
///
/// Every field defaults when absent or `null` so that an incomplete
/// notification surfaces as a [`ParseError`] instead of a deserialization
/// failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Payload {
    #[serde(deserialize_with = "null_as_default")]
    pub account_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub alarm_arn: String,
    #[serde(deserialize_with = "null_as_default")]
    pub alarm_data: AlarmData,
    #[serde(deserialize_with = "null_as_default")]
    pub region: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(deserialize_with = "null_as_default")]
    pub time: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlarmData {
    #[serde(deserialize_with = "null_as_default")]
    pub alarm_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub configuration: AlarmConfiguration,
    #[serde(deserialize_with = "null_as_default")]
    pub state: AlarmStateData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlarmConfiguration {
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub metrics: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlarmStateData {
    #[serde(deserialize_with = "null_as_default")]
    pub reason: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(deserialize_with = "null_as_default")]
    pub value: String,
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reasons an alarm notification is rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("failed to parse resource ARN {arn}: {reason}")]
    MalformedArn { arn: String, reason: &'static str },

    #[error("unexpected resource ARN {arn}: not a cloudwatch alarm")]
    NotAnAlarm { arn: String },

    #[error("alarm name is empty")]
    MissingAlarmName,

    #[error("alarm state is empty")]
    MissingStateValue,
}

/// The six colon-separated sections of an Amazon Resource Name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl FromStr for Arn {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("arn:").ok_or("arn: invalid prefix")?;

        // The resource section may itself contain colons
        let sections: Vec<&str> = rest.splitn(5, ':').collect();
        if sections.len() != 5 {
            return Err("arn: not enough sections");
        }

        Ok(Self {
            partition: sections[0].to_string(),
            service: sections[1].to_string(),
            region: sections[2].to_string(),
            account_id: sections[3].to_string(),
            resource: sections[4].to_string(),
        })
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

impl Arn {
    /// True for `arn:<partition>:cloudwatch:<region>:<account>:alarm:<name>`
    pub fn is_cloudwatch_alarm(&self) -> bool {
        self.service == "cloudwatch" && self.resource.starts_with("alarm:")
    }
}

/// A validated alarm notification, alive for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmEvent {
    pub account_id: String,
    pub alarm_arn: Arn,
    pub alarm_name: String,
    pub state_value: String,
    pub state_reason: String,
    pub region: String,
    pub time: String,
}

impl AlarmEvent {
    /// Whether the alarm transitioned into `ALARM`
    pub fn is_alarming(&self) -> bool {
        self.state_value == ALARM_STATE
    }
}

/// Validate a notification and extract the alarm identity and state.
///
/// Checks run in a fixed order: ARN shape, ARN type, alarm name, state value.
pub fn parse_payload(payload: &Payload) -> Result<AlarmEvent, ParseError> {
    let arn: Arn = payload
        .alarm_arn
        .parse()
        .map_err(|reason| ParseError::MalformedArn {
            arn: payload.alarm_arn.clone(),
            reason,
        })?;

    if !arn.is_cloudwatch_alarm() {
        return Err(ParseError::NotAnAlarm {
            arn: payload.alarm_arn.clone(),
        });
    }

    let data = &payload.alarm_data;
    if data.alarm_name.is_empty() {
        return Err(ParseError::MissingAlarmName);
    }
    if data.state.value.is_empty() {
        return Err(ParseError::MissingStateValue);
    }

    Ok(AlarmEvent {
        account_id: payload.account_id.clone(),
        alarm_arn: arn,
        alarm_name: data.alarm_name.clone(),
        state_value: data.state.value.clone(),
        state_reason: data.state.reason.clone(),
        region: payload.region.clone(),
        time: payload.time.clone(),
    })
}
