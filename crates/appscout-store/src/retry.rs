//! Retry with exponential backoff for transient store errors.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors (429, network failures, 5xx). Parse failures and 404s
//! are returned immediately without retrying.

use std::future::Future;
use std::time::Duration;

use crate::error::StoreError;

/// Returns `true` if `err` represents a transient condition worth retrying
/// after a backoff delay.
///
/// Retriable: [`StoreError::RateLimited`], [`StoreError::Http`], and
/// [`StoreError::UnexpectedStatus`] in the 5xx range. Everything else
/// (404, 4xx, parse failures, bad base URL) is propagated immediately.
fn is_retriable(err: &StoreError) -> bool {
    match err {
        StoreError::RateLimited { .. } | StoreError::Http(_) => true,
        StoreError::UnexpectedStatus { status, .. } => *status >= 500,
        StoreError::Deserialize { .. }
        | StoreError::NotFound { .. }
        | StoreError::InvalidBaseUrl { .. } => false,
    }
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// On a retriable error the function sleeps for `backoff_base_secs * 2^attempt`
/// seconds and tries again, up to `max_retries` additional attempts after the
/// first try. Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_secs,
                    error = %err,
                    "transient store error, retrying after backoff"
                );
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                attempt += 1;
            }
        }
    }
}
