//! Packages result lines and uploads them to the chat channel.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::adapters::EvidenceSink;
use crate::domain::EvidenceBundle;

use super::cancel::cancellable;
use super::error::PublishError;

pub struct EvidencePublisher<'a, S: ?Sized> {
    sink: &'a S,
    channel_id: &'a str,
}

impl<'a, S: EvidenceSink + ?Sized> EvidencePublisher<'a, S> {
    pub fn new(sink: &'a S, channel_id: &'a str) -> Self {
        Self { sink, channel_id }
    }

    /// Upload `lines` as `<query_name>-<timestamp>.txt`, stamped now
    pub async fn publish(
        &self,
        query_name: &str,
        lines: &[String],
        cancel: &CancellationToken,
    ) -> Result<EvidenceBundle, PublishError> {
        self.publish_at(query_name, lines, Utc::now(), cancel).await
    }

    pub async fn publish_at(
        &self,
        query_name: &str,
        lines: &[String],
        at: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<EvidenceBundle, PublishError> {
        let bundle = EvidenceBundle::new(self.channel_id, query_name, lines, at);
        info!(
            channel = %bundle.channel_id,
            filename = %bundle.filename,
            size = bundle.size(),
            sha256 = %bundle.body_sha256(),
            "posting evidence"
        );

        cancellable(
            cancel,
            self.sink
                .upload(&bundle.channel_id, &bundle.filename, &bundle.body),
        )
        .await
        .map_err(|_| PublishError::Cancelled)?
        .map_err(|source| PublishError::Upload {
            channel_id: bundle.channel_id.clone(),
            filename: bundle.filename.clone(),
            source,
        })?;

        Ok(bundle)
    }
}
