//! Maps an alarm to its saved query by naming convention.
//!
//! A query named `<prefix><alarm name>` belongs to the alarm. The service
//! matches by prefix, so `alarmsight_api` also returns `alarmsight_api-v2`;
//! the lexicographically smallest name wins, which is the exact match when
//! one exists.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::adapters::LogQueryService;
use crate::domain::QueryDefinition;

use super::cancel::cancellable;
use super::error::ResolveError;

/// Lookup key for an alarm's query definition
pub fn lookup_key(prefix: &str, alarm_name: &str) -> String {
    format!("{}{}", prefix, alarm_name)
}

/// Deterministic choice among prefix matches
pub fn select_definition(candidates: Vec<QueryDefinition>) -> Option<QueryDefinition> {
    candidates
        .into_iter()
        .min_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)))
}

pub struct QueryResolver<'a, L: ?Sized> {
    service: &'a L,
    prefix: &'a str,
}

impl<'a, L: LogQueryService + ?Sized> QueryResolver<'a, L> {
    pub fn new(service: &'a L, prefix: &'a str) -> Self {
        Self { service, prefix }
    }

    /// Find the query definition for `alarm_name`.
    ///
    /// `Ok(None)` means nothing is registered for this alarm.
    pub async fn resolve(
        &self,
        alarm_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<QueryDefinition>, ResolveError> {
        let key = lookup_key(self.prefix, alarm_name);

        let candidates = cancellable(cancel, self.service.list_query_definitions(&key))
            .await
            .map_err(|_| ResolveError::Cancelled)?
            .map_err(|source| ResolveError::Lookup {
                lookup_key: key.clone(),
                source,
            })?;

        if candidates.len() > 1 {
            debug!(
                lookup_key = %key,
                count = candidates.len(),
                "multiple query definitions match, picking the smallest name"
            );
        }

        let selected = select_definition(candidates);
        if selected.is_none() {
            info!(alarm_name, lookup_key = %key, "no query definitions found for alarm");
        }
        Ok(selected)
    }
}
