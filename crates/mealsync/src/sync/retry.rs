//! Bounded retry with capped exponential backoff
//!
//! One executor is shared by the push path (apply a single pending mutation)
//! and the pull path (fetch the remote set for reconciliation). The executor
//! never queues anything itself; deciding what to do with an exhausted
//! operation is the caller's job.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use super::SyncError;

/// Backoff parameters. Delay before attempt `n + 1` is
/// `min(initial_delay * factor^n, max_delay)`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempt ceiling, including the first try. Treated as at least 1.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(5000),
            factor: 2.0,
        }
    }
}

/// Executes one idempotent remote action with bounded retries.
#[derive(Debug, Clone, Default)]
pub struct RetryingExecutor {
    policy: RetryPolicy,
}

impl RetryingExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Run `op` up to `max_attempts` times, sleeping between attempts.
    ///
    /// Intermediate failures are logged and swallowed; the final attempt's
    /// error propagates as `SyncError::RetriesExhausted`.
    pub async fn execute<T, F, Fut>(&self, mut op: F) -> Result<T, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = mealsync_core::Result<T>>,
    {
        let attempts = self.policy.max_attempts.max(1);
        let mut delay = self.policy.initial_delay;

        for attempt in 1..attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!("attempt {attempt}/{attempts} failed, retrying in {delay:?}: {e}");
                }
            }
            sleep(delay).await;
            delay = delay.mul_f64(self.policy.factor).min(self.policy.max_delay);
        }

        op().await
            .map_err(|source| SyncError::RetriesExhausted { attempts, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealsync_core::StoreError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn returns_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = RetryingExecutor::default();

        let result = executor
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, StoreError>(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let executor = RetryingExecutor::default();

        let result = executor
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(StoreError::Unavailable("flaky".into()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_carries_attempt_count_and_last_error() {
        let executor = RetryingExecutor::default();

        let result: Result<(), _> = executor
            .execute(|| async { Err(StoreError::Unavailable("down".into())) })
            .await;

        match result {
            Err(SyncError::RetriesExhausted { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(source, StoreError::Unavailable(_)));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_and_caps_at_max_delay() {
        let executor = RetryingExecutor::new(RetryPolicy {
            max_attempts: 5,
            ..RetryPolicy::default()
        });
        let attempt_times = Arc::new(Mutex::new(Vec::new()));

        let _: Result<(), _> = executor
            .execute(|| {
                let attempt_times = Arc::clone(&attempt_times);
                async move {
                    attempt_times.lock().unwrap().push(Instant::now());
                    Err(StoreError::Unavailable("down".into()))
                }
            })
            .await;

        let times = attempt_times.lock().unwrap();
        let gaps: Vec<u64> = times
            .windows(2)
            .map(|w| (w[1] - w[0]).as_millis() as u64)
            .collect();
        // 1000, 2000, 4000, then capped at 5000 instead of 8000.
        assert_eq!(gaps, vec![1000, 2000, 4000, 5000]);
    }
}
