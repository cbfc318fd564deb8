//! Slack Web API adapter for posting evidence files.
//!
//! Uses the external upload flow: reserve an upload URL, send the bytes
//! there, then complete the upload and share it into the channel.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::EvidenceSink;

const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Slack Web API client
pub struct SlackClient {
    /// Bot or user token
    token: String,
    /// API base URL (overridable for tests)
    api_base: String,
    /// HTTP client
    client: reqwest::Client,
}

/// Envelope shared by every Web API response
#[derive(Debug, Deserialize)]
struct SlackResponse<T> {
    ok: bool,
    error: Option<String>,
    #[serde(flatten)]
    result: Option<T>,
}

impl<T> SlackResponse<T> {
    /// Turn an `ok: false` envelope into an error
    fn into_result(self, method: &str) -> Result<Option<T>> {
        if !self.ok {
            anyhow::bail!(
                "Slack API error from {}: {}",
                method,
                self.error.unwrap_or_else(|| "unknown_error".to_string())
            );
        }
        Ok(self.result)
    }
}

/// Result of files.getUploadURLExternal
#[derive(Debug, Deserialize)]
struct UploadTicket {
    upload_url: String,
    file_id: String,
}

/// One entry of files.completeUploadExternal's `files` array
#[derive(Debug, Serialize)]
struct CompletedFile<'a> {
    id: &'a str,
    title: &'a str,
}

#[derive(Debug, Serialize)]
struct CompleteUploadRequest<'a> {
    files: Vec<CompletedFile<'a>>,
    channel_id: &'a str,
}

/// Ignored payload for calls whose body we only check for `ok`
#[derive(Debug, Deserialize)]
struct Empty {}

impl SlackClient {
    /// Create a new Slack client
    pub fn new(token: String) -> Self {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Create a client against a different API root
    pub fn with_api_base(token: String, api_base: impl Into<String>) -> Self {
        Self {
            token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build API URL
    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    /// Reserve an upload slot for `length` bytes
    async fn get_upload_url(&self, filename: &str, length: usize) -> Result<UploadTicket> {
        let method = "files.getUploadURLExternal";
        let length = length.to_string();

        let response: SlackResponse<UploadTicket> = self
            .client
            .post(self.api_url(method))
            .bearer_auth(&self.token)
            .form(&[("filename", filename), ("length", length.as_str())])
            .send()
            .await
            .context("Failed to request Slack upload URL")?
            .json()
            .await
            .context("Failed to parse Slack response")?;

        response
            .into_result(method)?
            .context("Slack upload URL response is missing upload_url or file_id")
    }

    /// Send the file bytes to the reserved URL
    async fn send_content(&self, upload_url: &str, filename: &str, content: &str) -> Result<()> {
        let response = self
            .client
            .post(upload_url)
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(content.to_string())
            .send()
            .await
            .with_context(|| format!("Failed to upload {} to Slack", filename))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Slack upload error ({}): {}", status, text);
        }
        Ok(())
    }

    /// Finish the upload and share it into `channel_id`
    async fn complete_upload(&self, file_id: &str, title: &str, channel_id: &str) -> Result<()> {
        let method = "files.completeUploadExternal";
        let request = CompleteUploadRequest {
            files: vec![CompletedFile { id: file_id, title }],
            channel_id,
        };

        let response: SlackResponse<Empty> = self
            .client
            .post(self.api_url(method))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .context("Failed to complete Slack upload")?
            .json()
            .await
            .context("Failed to parse Slack response")?;

        response.into_result(method)?;
        Ok(())
    }
}

#[async_trait]
impl EvidenceSink for SlackClient {
    async fn upload(&self, channel_id: &str, filename: &str, content: &str) -> Result<()> {
        let ticket = self.get_upload_url(filename, content.len()).await?;
        self.send_content(&ticket.upload_url, filename, content).await?;
        self.complete_upload(&ticket.file_id, filename, channel_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let client = SlackClient::new("xoxb-TOKEN".to_string());
        assert_eq!(
            client.api_url("files.getUploadURLExternal"),
            "https://slack.com/api/files.getUploadURLExternal"
        );

        let local = SlackClient::with_api_base("t".to_string(), "http://localhost:9000/api/");
        assert_eq!(local.api_url("x"), "http://localhost:9000/api/x");
    }

    #[test]
    fn test_upload_ticket_response() {
        let body = r#"{"ok":true,"upload_url":"https://files.slack.com/upload/v1/abc","file_id":"F123"}"#;
        let response: SlackResponse<UploadTicket> = serde_json::from_str(body).unwrap();
        let ticket = response.into_result("m").unwrap().unwrap();
        assert_eq!(ticket.file_id, "F123");
        assert_eq!(ticket.upload_url, "https://files.slack.com/upload/v1/abc");
    }

    #[test]
    fn test_error_response() {
        let body = r#"{"ok":false,"error":"not_in_channel"}"#;
        let response: SlackResponse<Empty> = serde_json::from_str(body).unwrap();
        let err = response.into_result("files.completeUploadExternal").unwrap_err();
        assert!(err.to_string().contains("not_in_channel"));
    }

    #[test]
    fn test_complete_request_shape() {
        let request = CompleteUploadRequest {
            files: vec![CompletedFile { id: "F1", title: "q-20240101-000000.txt" }],
            channel_id: "C1",
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "files": [{"id": "F1", "title": "q-20240101-000000.txt"}],
                "channel_id": "C1"
            })
        );
    }
}
