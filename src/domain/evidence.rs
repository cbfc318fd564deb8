//! The packaged query output delivered to a chat channel.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Timestamp layout used in attachment filenames (`YYYYMMDD-HHMMSS`)
pub const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// A text attachment ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceBundle {
    pub channel_id: String,
    pub filename: String,
    pub body: String,
}

impl EvidenceBundle {
    /// Join `lines` with newlines and name the file after the query and `at`
    pub fn new(
        channel_id: impl Into<String>,
        query_name: &str,
        lines: &[String],
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            filename: format!("{}-{}.txt", query_name, at.format(FILENAME_TIMESTAMP_FORMAT)),
            body: lines.join("\n"),
        }
    }

    /// SHA-256 of the body, hex encoded
    pub fn body_sha256(&self) -> String {
        hex::encode(Sha256::digest(self.body.as_bytes()))
    }

    pub fn size(&self) -> usize {
        self.body.len()
    }
}
