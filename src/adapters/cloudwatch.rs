//! CloudWatch Logs Insights adapter.
//!
//! Every log event gets the system field `@message` holding the raw line;
//! that is the only field the pipeline reads back.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::types as cwl;
use aws_sdk_cloudwatchlogs::Client;

use super::LogQueryService;
use crate::domain::{QueryDefinition, QueryPoll, QueryStatistics, QueryStatus, QueryWindow, ResultField};

/// Logs Insights client
pub struct CloudWatchLogs {
    client: Client,
}

impl CloudWatchLogs {
    /// Create from a loaded AWS configuration
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self::from_client(Client::new(config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogQueryService for CloudWatchLogs {
    async fn list_query_definitions(&self, prefix: &str) -> Result<Vec<QueryDefinition>> {
        let mut definitions = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_query_definitions()
                .query_definition_name_prefix(prefix)
                .set_next_token(token.take())
                .send()
                .await
                .with_context(|| format!("failed to describe query definitions with prefix '{}'", prefix))?;

            definitions.extend(response.query_definitions().iter().map(convert_definition));

            token = response.next_token().map(str::to_owned);
            if token.is_none() {
                break;
            }
        }

        Ok(definitions)
    }

    async fn start_query(
        &self,
        definition: &QueryDefinition,
        window: QueryWindow,
    ) -> Result<String> {
        // Definitions may name their sources inside the query string instead
        let log_groups = (!definition.log_group_names.is_empty())
            .then(|| definition.log_group_names.clone());

        let response = self
            .client
            .start_query()
            .query_string(&definition.query_string)
            .start_time(window.start_epoch())
            .end_time(window.end_epoch())
            .set_log_group_names(log_groups)
            .send()
            .await
            .with_context(|| format!("failed to start query '{}'", definition.name))?;

        response
            .query_id()
            .map(str::to_owned)
            .context("start query response has no query id")
    }

    async fn get_query_results(&self, query_id: &str) -> Result<QueryPoll> {
        let response = self
            .client
            .get_query_results()
            .query_id(query_id)
            .send()
            .await
            .with_context(|| format!("failed to get query results for {}", query_id))?;

        let status = response
            .status()
            .map(|s| QueryStatus::parse(s.as_str()))
            .unwrap_or_else(|| QueryStatus::Unknown(String::new()));

        let rows = response
            .results()
            .iter()
            .map(|row| row.iter().map(convert_field).collect())
            .collect();

        let statistics = response.statistics().map(|s| QueryStatistics {
            records_matched: s.records_matched(),
            records_scanned: s.records_scanned(),
            bytes_scanned: s.bytes_scanned(),
        });

        Ok(QueryPoll {
            status,
            rows,
            statistics,
        })
    }
}

fn convert_definition(def: &cwl::QueryDefinition) -> QueryDefinition {
    QueryDefinition {
        id: def.query_definition_id().unwrap_or_default().to_string(),
        name: def.name().unwrap_or_default().to_string(),
        query_string: def.query_string().unwrap_or_default().to_string(),
        log_group_names: def.log_group_names().to_vec(),
    }
}

fn convert_field(cell: &cwl::ResultField) -> ResultField {
    ResultField::new(
        cell.field().unwrap_or_default(),
        cell.value().unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_definition() {
        let sdk = cwl::QueryDefinition::builder()
            .query_definition_id("qd-1")
            .name("alarmsight_api-errors")
            .query_string("fields @message | filter @message like /ERROR/")
            .log_group_names("/aws/lambda/api")
            .log_group_names("/aws/lambda/worker")
            .build();

        let def = convert_definition(&sdk);
        assert_eq!(def.id, "qd-1");
        assert_eq!(def.name, "alarmsight_api-errors");
        assert_eq!(def.log_group_names, vec!["/aws/lambda/api", "/aws/lambda/worker"]);
    }

    #[test]
    fn test_convert_field_missing_parts() {
        let cell = cwl::ResultField::builder().field("@message").build();
        assert_eq!(convert_field(&cell), ResultField::new("@message", ""));
    }
}
