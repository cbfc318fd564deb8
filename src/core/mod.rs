//! Core pipeline logic.
//!
//! This module contains:
//! - Resolver: Alarm name to saved query definition
//! - Runner: Query submission and polling
//! - Publisher: Evidence packaging and upload
//! - Pipeline: Sequencing of the stages for one alarm

pub mod cancel;
pub mod error;
pub mod orchestrator;
pub mod publisher;
pub mod resolver;
pub mod runner;

// Re-export commonly used types
pub use cancel::{cancel_after, cancellable, Cancelled};
pub use error::{AlarmError, PublishError, ResolveError, RunnerError, Stage};
pub use orchestrator::{Outcome, Pipeline};
pub use publisher::EvidencePublisher;
pub use resolver::{lookup_key, select_definition, QueryResolver};
pub use runner::{QueryRunner, RunnerSettings};
