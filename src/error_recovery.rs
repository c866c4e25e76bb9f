// src/error_recovery.rs
//! Retry with exponential backoff for transport round trips.

use crate::config::RetryPolicy;
use crate::error::AppError;

/// Retries an async operation with exponential backoff.
///
/// Only errors that report themselves retryable are tried again; anything
/// else is returned from the attempt that produced it.
pub async fn retry_with_backoff<F, T, Fut>(
    mut operation: F,
    policy: &RetryPolicy,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_attempts && e.is_retryable() => {
                log::warn!(
                    "Attempt {}/{} failed ({}), retrying after {:?}",
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;

                // Exponential backoff with cap
                delay = std::cmp::min(delay * 2, policy.max_delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
