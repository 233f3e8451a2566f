//! Bounded retry for idempotent store reads.

use std::future::Future;
use std::time::Duration;

use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::warn;

use crate::error::AppError;

/// Runs a read, retrying only on transient storage errors.
///
/// Backoff is exponential (10ms, 20ms, 40ms ... capped at 200ms) with jitter.
/// `retries` is the number of extra attempts after the first one. Writes must
/// never go through this helper.
pub async fn with_read_retry<T, F, Fut>(
    operation: &str,
    retries: usize,
    action: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let strategy = ExponentialBackoff::from_millis(2)
        .factor(5)
        .max_delay(Duration::from_millis(200))
        .map(jitter)
        .take(retries);

    RetryIf::spawn(strategy, action, |e: &AppError| {
        let transient = e.is_transient();
        if transient {
            warn!("Read '{}' failed transiently, retrying: {}", operation, e);
        }
        transient
    })
    .await
}
