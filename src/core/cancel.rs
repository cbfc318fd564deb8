//! Cancellation of in-flight service calls.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Marker returned when the token fired before the future finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Drive `fut` unless `token` is cancelled first
pub async fn cancellable<F>(token: &CancellationToken, fut: F) -> Result<F::Output, Cancelled>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Cancelled),
        output = fut => Ok(output),
    }
}

/// Cancel `token` once `after` has elapsed.
///
/// Abort the returned handle when the run finishes first.
pub fn cancel_after(token: &CancellationToken, after: Duration) -> JoinHandle<()> {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        token.cancel();
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_when_not_cancelled() {
        let token = CancellationToken::new();
        assert_eq!(cancellable(&token, async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_cancelled_token_wins() {
        let token = CancellationToken::new();
        token.cancel();
        let result = cancellable(&token, tokio::time::sleep(Duration::from_secs(60))).await;
        assert_eq!(result, Err(Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_after_fires() {
        let token = CancellationToken::new();
        let _handle = cancel_after(&token, Duration::from_millis(5));
        let result = cancellable(&token, tokio::time::sleep(Duration::from_secs(60))).await;
        assert_eq!(result, Err(Cancelled));
    }
}
