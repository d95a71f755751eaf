// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{future::Future, time::Duration};
use tokio::time::sleep;
use tracing::{error, warn};

pub enum RetryError {
    Failure(eyre::Error),
    Retry(eyre::Error),
}

pub fn to_retry(e: impl Into<eyre::Error>) -> RetryError {
    RetryError::Retry(e.into())
}

/// Retries an async operation with exponential backoff. This is a
/// transmission-level retry for transient RPC faults; the decryption
/// lifecycle retry is a separate protocol driven by the registry.
///
/// # Arguments
/// * `operation` - Async function to retry
/// * `max_attempts` - Maximum number of attempts
/// * `initial_delay_ms` - Initial delay between attempts, doubled each time
pub async fn retry_with_backoff<F, Fut, T>(
    operation: F,
    max_attempts: u32,
    initial_delay_ms: u64,
) -> eyre::Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, RetryError>>,
{
    let mut current_attempt = 1;
    let mut delay_ms = initial_delay_ms;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(re) => match re {
                RetryError::Retry(e) => {
                    if current_attempt >= max_attempts {
                        return Err(eyre::eyre!(
                            "Operation failed after {} attempts. Last error: {}",
                            max_attempts,
                            e
                        ));
                    }

                    warn!(
                        "Attempt {}/{} failed, retrying in {}ms: {}",
                        current_attempt, max_attempts, delay_ms, e
                    );

                    sleep(Duration::from_millis(delay_ms)).await;
                    current_attempt += 1;
                    delay_ms *= 2;
                }
                RetryError::Failure(e) => {
                    error!("non-retryable failure, returning to caller");
                    return Err(e);
                }
            },
        }
    }
}

fn should_retry_error(error: &str, retry_on_errors: &[&str]) -> bool {
    if retry_on_errors.is_empty() {
        return true;
    }
    retry_on_errors.iter().any(|code| error.contains(code))
}

/// Wraps a write submission in `retry_with_backoff`, retrying only when the
/// error text matches one of `retry_on_errors` (empty list retries all).
pub async fn submit_with_retry<F, Fut, T>(
    operation_name: &str,
    retry_on_errors: &[&str],
    max_attempts: u32,
    initial_delay_ms: u64,
    tx_fn: F,
) -> eyre::Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = eyre::Result<T>>,
{
    let op_name = operation_name.to_string();
    let retry_codes: Vec<String> = retry_on_errors.iter().map(|s| s.to_string()).collect();

    retry_with_backoff(
        || {
            let op_name = op_name.clone();
            let retry_codes = retry_codes.clone();
            let fut = tx_fn();
            async move {
                match fut.await {
                    Ok(value) => Ok(value),
                    Err(e) => {
                        let error_str = format!("{}", e);
                        let retry_refs: Vec<&str> =
                            retry_codes.iter().map(|s| s.as_str()).collect();
                        if should_retry_error(&error_str, &retry_refs) {
                            warn!("{}: error, will retry: {}", op_name, e);
                            Err(RetryError::Retry(e))
                        } else {
                            Err(RetryError::Failure(e))
                        }
                    }
                }
            }
        },
        max_attempts,
        initial_delay_ms,
    )
    .await
}
