//! Export of SSM Parameter Store values into the process environment.
//!
//! Lets a deployment keep the Slack token in Parameter Store and point
//! `SSM_PATH` at it instead of putting secrets in the function config.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use aws_sdk_ssm::Client;
use tracing::{info, warn};

/// Attempts made to list the parameters before giving up
pub const EXPORT_ATTEMPTS: u32 = 3;

const INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Map a parameter name under `path` to an environment variable name.
///
/// `/app/prod/slack-token` under `/app/prod` becomes `SLACK_TOKEN`.
pub fn env_var_name(path: &str, parameter: &str) -> String {
    let prefix = path.trim_end_matches('/');
    parameter
        .strip_prefix(prefix)
        .unwrap_or(parameter)
        .trim_start_matches('/')
        .chars()
        .map(|c| match c {
            '/' | '-' | '.' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// Fetch every parameter below `path` (recursive, decrypted)
async fn fetch_parameters(client: &Client, path: &str) -> Result<Vec<(String, String)>> {
    let mut parameters = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let response = client
            .get_parameters_by_path()
            .path(path)
            .recursive(true)
            .with_decryption(true)
            .set_next_token(token.take())
            .send()
            .await
            .with_context(|| format!("failed to get parameters by path {}", path))?;

        for parameter in response.parameters() {
            if let (Some(name), Some(value)) = (parameter.name(), parameter.value()) {
                parameters.push((env_var_name(path, name), value.to_string()));
            }
        }

        token = response.next_token().map(str::to_owned);
        if token.is_none() {
            break;
        }
    }

    Ok(parameters)
}

/// Call `f` up to `attempts` times, doubling the delay after each failure.
///
/// `f` receives the 1-based attempt number. The last error is returned with
/// the attempt count attached.
pub async fn with_retries<F, Fut, T>(attempts: u32, initial_delay: Duration, mut f: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match f(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                let delay = initial_delay * 2u32.pow(attempt - 1);
                warn!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "SSM export failed, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return Err(e.context(format!("failed to export SSM parameters after {} attempts", attempt)))
            }
        }
    }
}

/// Load all parameters under `path` as `(VAR_NAME, value)` pairs
pub async fn load_parameters(config: &aws_config::SdkConfig, path: &str) -> Result<Vec<(String, String)>> {
    let client = Client::new(config);
    let parameters = with_retries(EXPORT_ATTEMPTS, INITIAL_DELAY, |_| fetch_parameters(&client, path)).await?;
    info!(path, count = parameters.len(), "loaded SSM parameters");
    Ok(parameters)
}

/// Set each pair in the process environment.
///
/// Call only while no other thread can read the environment.
pub fn export_to_env(parameters: Vec<(String, String)>) -> Vec<String> {
    parameters
        .into_iter()
        .map(|(name, value)| {
            std::env::set_var(&name, value);
            name
        })
        .collect()
}
