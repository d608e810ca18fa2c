//! Retry helper for idempotent aggregator calls

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

/// Runs `operation` up to `attempts` times, sleeping `delay` between tries.
///
/// Meant for idempotent lookups only; the last transport error is returned
/// once the attempts are spent.
pub async fn with_retry<F, Fut, T>(mut operation: F, attempts: usize, delay: Duration) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, reqwest::Error>>,
{
    let mut remaining = attempts.max(1);
    loop {
        remaining -= 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if remaining > 0 => {
                debug!(%error, remaining, "Transient request failure, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(error) => return Err(error.into()),
        }
    }
}
