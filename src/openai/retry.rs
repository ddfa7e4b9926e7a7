// Retry logic with exponential backoff

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// How many attempts to make and how long to wait between them
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }
}

/// Execute `f`, retrying errors for which `retryable` returns true.
///
/// Delay doubles after each failed attempt. Non-retryable errors and the
/// error from the final attempt are returned as-is.
pub async fn with_retry<F, Fut, T, E>(policy: RetryPolicy, retryable: fn(&E) -> bool, f: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts || !retryable(&e) {
                    return Err(e);
                }

                let delay = policy.base_delay * 2u32.pow(attempt - 1);
                tracing::warn!(
                    "Request failed (attempt {}/{}): {}; retrying in {:?}",
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                sleep(delay).await;
            }
        }
    }
}
