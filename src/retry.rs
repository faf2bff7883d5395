//! Deadline-bounded retry executor
//!
//! Runs an async operation until it succeeds, fails with a non-retryable
//! error, or the deadline elapses. REST writes back off exponentially;
//! status-polling loops wait a constant interval.
//!
//! # Example
//!
//! ```ignore
//! use castai_provider::retry::{retry_transient, Backoff};
//!
//! let cluster = retry_transient(
//!     Duration::from_secs(300),
//!     &Backoff::rest_writes(),
//!     "update cluster",
//!     || client.update_cluster(&id, &request),
//! ).await?;
//! ```

use crate::error::ProviderError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Delay policy between attempts
#[derive(Clone, Debug, PartialEq)]
pub enum Backoff {
    /// `initial * factor^(attempt-1)`, capped at `max`
    Exponential {
        initial: Duration,
        factor: f64,
        max: Duration,
    },
    /// Same delay after every attempt
    Constant(Duration),
}

impl Backoff {
    /// Policy for REST writes: 1s, doubling, capped at 30s
    pub fn rest_writes() -> Self {
        Backoff::Exponential {
            initial: Duration::from_secs(1),
            factor: 2.0,
            max: Duration::from_secs(30),
        }
    }

    /// Policy for status-polling loops: every 10s
    pub fn polling() -> Self {
        Backoff::Constant(Duration::from_secs(10))
    }

    /// Delay to wait after the given (1-based) failed attempt
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Constant(d) => *d,
            Backoff::Exponential {
                initial,
                factor,
                max,
            } => {
                let exp = attempt.saturating_sub(1).min(63) as i32;
                let secs = initial.as_secs_f64() * factor.powi(exp);
                Duration::from_secs_f64(secs.min(max.as_secs_f64()))
            }
        }
    }
}

/// What an attempt tells the executor
#[derive(Debug)]
pub enum RetryError {
    /// Sleep and try again
    Retryable(ProviderError),
    /// Stop and surface this error
    NonRetryable(ProviderError),
}

impl RetryError {
    pub fn into_inner(self) -> ProviderError {
        match self {
            RetryError::Retryable(e) | RetryError::NonRetryable(e) => e,
        }
    }
}

impl From<ProviderError> for RetryError {
    fn from(e: ProviderError) -> Self {
        if e.is_retryable() {
            RetryError::Retryable(e)
        } else {
            RetryError::NonRetryable(e)
        }
    }
}

/// Run `operation` until it returns `Ok`, a non-retryable error, or `timeout` elapses
///
/// When the deadline passes while the last outcome was retryable, the last
/// observed error is surfaced inside `DeadlineExceeded`. An attempt still in
/// flight at the deadline is dropped, which aborts its HTTP exchange.
pub async fn retry_context<T, F, Fut>(
    timeout: Duration,
    backoff: &Backoff,
    operation: &str,
    mut f: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetryError>>,
{
    let deadline = Instant::now() + timeout;
    let mut attempt = 0u32;
    let mut last: Option<ProviderError> = None;

    loop {
        attempt += 1;

        let outcome = match tokio::time::timeout_at(deadline, f()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let last = last.unwrap_or_else(|| {
                    ProviderError::Transport(format!("{} cancelled at deadline", operation))
                });
                return Err(deadline_exceeded(operation, last));
            }
        };

        let err = match outcome {
            Ok(value) => return Ok(value),
            Err(RetryError::NonRetryable(e)) => return Err(e),
            Err(RetryError::Retryable(e)) => e,
        };

        let delay = backoff.delay(attempt);
        if matches!(err, ProviderError::Pending(_)) {
            debug!(operation = %operation, attempt = attempt, reason = %err, "Waiting");
        } else {
            warn!(
                operation = %operation,
                attempt = attempt,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "Operation failed, retrying"
            );
        }

        let wake = (Instant::now() + delay).min(deadline);
        tokio::time::sleep_until(wake).await;

        if Instant::now() >= deadline {
            return Err(deadline_exceeded(operation, err));
        }
        last = Some(err);
    }
}

/// Retry an operation whose errors are classified by [`ProviderError::is_retryable`]
pub async fn retry_transient<T, F, Fut>(
    timeout: Duration,
    backoff: &Backoff,
    operation: &str,
    mut f: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    retry_context(timeout, backoff, operation, || {
        let fut = f();
        async move { fut.await.map_err(RetryError::from) }
    })
    .await
}

fn deadline_exceeded(operation: &str, last: ProviderError) -> ProviderError {
    ProviderError::DeadlineExceeded {
        operation: operation.to_string(),
        last: Box::new(last),
    }
}

#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;
