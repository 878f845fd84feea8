//! Retry with exponential backoff for transient agent failures
//!
//! Only errors classified retryable by [`Error::is_retryable`] re-enter the
//! loop; everything else propagates immediately.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Backoff doubles on every failed attempt
const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, first try included
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Upper bound on a single delay
    pub max_delay: Duration,
    /// Add up to 25% random jitter to each delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set total attempts (first try included)
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the initial delay
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the delay cap
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enable or disable jitter
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay to sleep after the given failed attempt (1-based)
    fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f64
            * BACKOFF_MULTIPLIER.powi(attempt.saturating_sub(1) as i32);
        let capped = base.min(self.max_delay.as_millis() as f64) as u64;

        let delay_ms = if self.jitter {
            capped + pseudo_jitter(capped / 4)
        } else {
            capped
        };

        Duration::from_millis(delay_ms)
    }
}

/// Time-derived jitter; good enough for spacing retries without a rand dependency
fn pseudo_jitter(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()))
        .unwrap_or(0);
    nanos % max
}

/// Run an async agent operation, retrying transient failures with backoff.
///
/// Returns the first success, or the error from the last attempt. Errors for
/// which [`Error::is_retryable`] is false end the loop at once.
pub async fn retry_with_backoff<T, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u32 = 1;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Agent call succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < config.max_attempts && e.is_retryable() => {
                let delay = config.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Agent call failed, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                debug!(attempt, error = %e, "Agent call failed, giving up");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn transient() -> Error {
        Error::Agent {
            message: "transient failure".to_string(),
            retryable: true,
        }
    }

    #[test]
    fn test_delay_doubles_without_jitter() {
        let config = RetryConfig::new()
            .with_initial_delay(Duration::from_millis(100))
            .with_jitter(false);

        assert_eq!(config.delay_for(1), Duration::from_millis(100));
        assert_eq!(config.delay_for(2), Duration::from_millis(200));
        assert_eq!(config.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_respects_cap() {
        let config = RetryConfig::new()
            .with_initial_delay(Duration::from_secs(10))
            .with_max_delay(Duration::from_secs(15))
            .with_jitter(false);

        assert_eq!(config.delay_for(4), Duration::from_secs(15));
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let config = RetryConfig::new().with_max_attempts(0);
        assert_eq!(config.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let config = RetryConfig::new().with_initial_delay(Duration::from_millis(1));
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let value = retry_with_backoff(&config, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(7)
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_flaky_operation_eventually_succeeds() {
        let config = RetryConfig::new()
            .with_max_attempts(4)
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter(false);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let value = retry_with_backoff(&config, || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(transient())
                } else {
                    Ok(42)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_return_last_error() {
        let config = RetryConfig::new()
            .with_max_attempts(3)
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter(false);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = retry_with_backoff(&config, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(transient())
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Agent { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_escapes_immediately() {
        let config = RetryConfig::new()
            .with_max_attempts(5)
            .with_initial_delay(Duration::from_millis(1));
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = retry_with_backoff(&config, || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(Error::InvalidInput("bad path".to_string()))
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
