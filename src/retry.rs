//! Retry logic with exponential backoff
//!
//! Only transient server errors are retried. Every other failure (timeouts,
//! connection errors, client errors) is returned to the caller after the first
//! attempt so the fetch orchestrator can move on to the proxy route.
//!
//! # Example
//!
//! ```no_run
//! use asset_localizer::retry::{IsRetryable, with_retry};
//! use asset_localizer::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Busy,
//!     Gone,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{:?}", self)
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Busy)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! let body = with_retry(&config, || async { Ok::<_, MyError>(b"ok".to_vec()) }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::FetchError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Server status codes treated as transient
pub const RETRYABLE_STATUS_CODES: &[u16] = &[500, 502, 503, 504];

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { status } => RETRYABLE_STATUS_CODES.contains(status),
            // Timeouts and connection failures go to the proxy route instead
            FetchError::Request(_) => false,
            FetchError::InvalidUrl(_) => false,
            FetchError::Io(_) => false,
            FetchError::NoProxy => false,
        }
    }
}

/// Execute an async operation, retrying transient failures with exponential backoff
///
/// The operation runs at most `1 + config.max_attempts` times.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::debug!(attempts = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;

                tracing::debug!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "Transient failure, retrying"
                );

                tokio::time::sleep(if config.jitter { add_jitter(delay) } else { delay }).await;
                delay = next_delay(delay, config);
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::debug!(
                        error = %e,
                        attempts = attempt + 1,
                        "Retries exhausted"
                    );
                }
                return Err(e);
            }
        }
    }
}

/// Backoff step, capped at `max_delay`
///
/// A product that is not a representable duration (negative, NaN, overflowing)
/// saturates to `max_delay`.
fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier)
        .unwrap_or(config.max_delay)
        .min(config.max_delay)
}

/// Add random jitter to a delay
///
/// The result lies between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let jitter_factor: f64 = rand::thread_rng().gen_range(0.0..=1.0);
    Duration::try_from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor)).unwrap_or(delay)
}
