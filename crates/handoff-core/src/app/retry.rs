//! Store retry policy: bounded exponential backoff, then fatal.
//!
//! A store write that keeps failing leaves the queues in an unknown state, so
//! after `max_attempts` the worker stops instead of carrying on.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::domain::{ConfigError, ErrorKind, HandoffError, StoreError};

/// Retry policy for store operations.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRetryPolicy {
    /// Total attempts including the first one. `1` means fail fast.
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Backoff multiplier for exponential backoff.
    pub multiplier: f64,

    /// Upper bound for a single delay.
    pub max_delay: Duration,

    /// Add up to 10% random extra delay.
    pub jitter: bool,
}

impl Default for StoreRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            multiplier: 2.0,
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl StoreRetryPolicy {
    /// No retry: the first failure is fatal.
    pub fn fail_fast() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        Ok(())
    }

    /// Delay before the next attempt, `attempts` being the failures so far (1-indexed).
    ///
    /// delay = base_delay * multiplier^(attempts - 1), capped at max_delay.
    /// With base=200ms, multiplier=2.0: 200ms, 400ms, 800ms, 1.6s, 3.2s, 5s, 5s...
    pub fn next_delay(&self, attempts: u32) -> Duration {
        let base_secs = self.base_delay.as_secs_f64();
        let delay_secs = base_secs * self.multiplier.powi(attempts.saturating_sub(1) as i32);
        let delay = Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()));
        if self.jitter {
            let extra = rand::thread_rng().gen_range(0.0..=0.1);
            delay.mul_f64(1.0 + extra)
        } else {
            delay
        }
    }

    /// Run `op` until it succeeds, the error is permanent, or attempts run out.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        queue: &str,
        mut op: F,
    ) -> Result<T, HandoffError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempts < self.max_attempts && e.kind() == ErrorKind::Transient => {
                    let delay = self.next_delay(attempts);
                    warn!(
                        operation,
                        queue,
                        attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "store operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(source) => {
                    return Err(HandoffError::StoreExhausted {
                        operation,
                        queue: queue.to_string(),
                        attempts,
                        source,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> StoreRetryPolicy {
        StoreRetryPolicy {
            max_attempts,
            jitter: false,
            ..StoreRetryPolicy::default()
        }
    }

    #[test]
    fn exponential_backoff_is_capped() {
        let policy = policy(10);
        assert_eq!(policy.next_delay(1), Duration::from_millis(200));
        assert_eq!(policy.next_delay(2), Duration::from_millis(400));
        assert_eq!(policy.next_delay(3), Duration::from_millis(800));
        assert_eq!(policy.next_delay(9), Duration::from_secs(5));
    }

    #[test]
    fn jitter_stays_within_ten_percent() {
        let policy = StoreRetryPolicy::default();
        for _ in 0..50 {
            let d = policy.next_delay(1);
            assert!(d >= Duration::from_millis(200));
            assert!(d <= Duration::from_millis(221));
        }
    }

    #[test]
    fn zero_attempts_is_invalid() {
        assert_eq!(policy(0).validate(), Err(ConfigError::NoAttempts));
        assert!(StoreRetryPolicy::fail_fast().validate().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = &AtomicU32::new(0);
        let result = policy(3)
            .run("push", "done", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(StoreError::command("LPUSH", "connection reset"))
                } else {
                    Ok(7)
                }
            })
            .await
            .unwrap();
        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let err = policy(3)
            .run("remove", "taken", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(StoreError::command("LREM", "connection reset"))
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            err,
            HandoffError::StoreExhausted { operation: "remove", attempts: 3, .. }
        ));
    }

    #[tokio::test]
    async fn fail_fast_does_not_retry() {
        let calls = &AtomicU32::new(0);
        let result = StoreRetryPolicy::fail_fast()
            .run("push", "done", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(StoreError::command("LPUSH", "boom"))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
