//! Bounded retry for transient store errors.
//!
//! Only [`PraxisError::is_transient`] errors are retried. Logical failures
//! (validation, invalid token, invalid state) are returned on first sight:
//! replaying a consumed claim token would report a second failure instead of
//! the original conflict.

use std::future::Future;
use std::time::Duration;

use crate::PraxisError;

/// Exponential backoff settings.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    ///
    /// Default: 3
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each following attempt.
    ///
    /// Default: 100ms
    pub base_delay: Duration,
    /// Upper bound for a single delay.
    ///
    /// Default: 2s
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after `attempt` (1-based) failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Runs `op` until it succeeds, fails with a non-transient error, or the
    /// attempt budget is spent.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut op: F) -> Result<T, PraxisError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PraxisError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    log::warn!(
                        target: "praxis",
                        "msg=\"transient store error, retrying\", operation=\"{operation}\", attempt={attempt}, delay_ms={}, error=\"{err}\"",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for(10), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let result = fast()
            .run("test", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(PraxisError::StoreUnavailable("down".into()))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast()
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PraxisError::StoreUnavailable("down".into()))
            })
            .await;

        assert!(matches!(result, Err(PraxisError::StoreUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_logical_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast()
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PraxisError::InvalidToken)
            })
            .await;

        assert_eq!(result, Err(PraxisError::InvalidToken));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
