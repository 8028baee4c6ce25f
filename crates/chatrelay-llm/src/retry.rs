use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::Result;

/// Exponential backoff bounded by a total wall-clock budget
///
/// Only errors classified transient by [`crate::LlmError::is_transient`] are
/// retried. A retry is abandoned when the next delay would overrun the budget.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_elapsed: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_elapsed: Duration::ZERO,
        }
    }

    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails permanently, or the budget runs out
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let mut attempt = 0u32;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    let delay = self.delay_for(attempt);
                    if started.elapsed() + delay > self.max_elapsed {
                        tracing::warn!(
                            operation,
                            attempts = attempt + 1,
                            error = %err,
                            "Retry budget exhausted"
                        );
                        return Err(err);
                    }

                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient upstream failure, retrying"
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
    use super::*;
    use crate::error::LlmError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(4), Duration::from_secs(16));
        assert_eq!(policy.delay_for(5), Duration::from_secs(30));
        assert_eq!(policy.delay_for(40), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result = RetryPolicy::default()
            .run("test", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(LlmError::Http { status: 503, body: "busy".into() })
                } else {
                    Ok("ok")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let result: Result<()> = RetryPolicy::default()
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(LlmError::Http { status: 401, body: "nope".into() })
            })
            .await;

        assert!(matches!(result, Err(LlmError::Http { status: 401, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let started = Instant::now();
        let result: Result<()> = RetryPolicy::default()
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(LlmError::Timeout)
            })
            .await;

        assert!(matches!(result, Err(LlmError::Timeout)));
        // 1 + 2 + 4 + 8 + 16 = 31s slept; the next 30s delay would overrun 60s
        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert!(started.elapsed() <= Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_none_policy_is_single_attempt() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let _: Result<()> = RetryPolicy::none()
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(LlmError::Timeout)
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
