//! Domain types for alarmsight.
//!
//! This module contains the core data structures:
//! - Alarm: Inbound notification and its validated form
//! - Query: Saved query definitions, execution status and results
//! - Evidence: The attachment posted to the chat channel

pub mod alarm;
pub mod evidence;
pub mod query;

// Re-export commonly used types
pub use alarm::{parse_payload, AlarmEvent, Arn, ParseError, Payload, ALARM_STATE};
pub use evidence::EvidenceBundle;
pub use query::{
    QueryDefinition, QueryPoll, QueryStatistics, QueryStatus, QueryWindow, ResultField,
};
