//! Retry policy for remote operations

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Which failures a [`RetryPolicy`] retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOn {
    /// Retry after any failure
    AnyFailure,
    /// Retry only when the remote reports a name collision
    CollisionOnly,
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry, doubled for each further retry
    pub backoff: Duration,
    /// Failures worth retrying
    pub retry_on: RetryOn,
}

impl Default for RetryPolicy {
    /// One retry, immediately, after any failure
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::ZERO,
            retry_on: RetryOn::AnyFailure,
        }
    }
}

impl RetryPolicy {
    /// Whether `err` is worth another attempt under this policy
    pub const fn is_retryable(&self, err: &Error) -> bool {
        match self.retry_on {
            RetryOn::AnyFailure => true,
            RetryOn::CollisionOnly => matches!(err, Error::RefAlreadyExists(_)),
        }
    }

    /// Delay after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff.saturating_mul(factor)
    }

    /// Run `operation` until it succeeds, a failure is not retryable, or the
    /// attempts are exhausted
    ///
    /// The closure receives the 1-based attempt number. The error of the
    /// last attempt is returned.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && self.is_retryable(&e) => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "attempt failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
