//! Retry loop with exponential backoff for tracker calls.
//!
//! ```text
//! attempt 0 ── Ok ──────────────────────────────▶ return Ok
//!     │
//!     ├─ RateLimited { retry_after: Some(d) } ──▶ sleep d, attempt + 1
//!     ├─ RateLimited { retry_after: None } ─────▶ sleep base * 2^attempt, attempt + 1
//!     ├─ Transport ─────────────────────────────▶ sleep base * 2^attempt, attempt + 1
//!     └─ anything else ─────────────────────────▶ return Err immediately
//!
//! attempt == max_retries and still failing ─────▶ return last Err
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::TrackerResult;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// How many times, and how patiently, a tracker call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (3 means 4 attempts total).
    pub max_retries: u32,
    /// Delay before the first retry when the server gives no hint.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay to wait after a failed `attempt` (0-based).
    ///
    /// A server hint always wins over the computed backoff.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        hint.unwrap_or_else(|| self.base_delay.saturating_mul(1u32 << attempt.min(16)))
    }

    /// Run `op` until it succeeds, fails with a non-retriable error, or the
    /// retry budget is spent.
    ///
    /// `operation` is only used for log context.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> TrackerResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = TrackerResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !err.is_retriable() || attempt >= self.max_retries {
                        return Err(err);
                    }

                    let delay = self.delay_for(attempt, err.retry_after());
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        category = %err.retry_category(),
                        error = %err,
                        "Tracker call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackerError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(100))
    }

    #[test]
    fn default_policy_allows_four_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
    }

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = fast_policy();
        assert_eq!(policy.delay_for(0, None), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1, None), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2, None), Duration::from_millis(400));
    }

    #[test]
    fn server_hint_overrides_backoff() {
        let policy = fast_policy();
        assert_eq!(
            policy.delay_for(2, Some(Duration::from_secs(9))),
            Duration::from_secs(9)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_then_success_returns_value() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = fast_policy()
            .run("create_issue", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(TrackerError::RateLimited {
                            retry_after: Some(Duration::from_secs(5)),
                        })
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failures_back_off_exponentially() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = fast_policy()
            .run("list_labels", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 3 {
                        Err(TrackerError::Transport("connection refused".into()))
                    } else {
                        Ok("labels")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "labels");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // 100 + 200 + 400
        assert!(start.elapsed() >= Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_returns_last_error() {
        let calls = AtomicU32::new(0);

        let result: TrackerResult<()> = fast_policy()
            .run("create_issue", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TrackerError::RateLimited { retry_after: None }) }
            })
            .await;

        assert!(matches!(result, Err(TrackerError::RateLimited { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_is_not_retried() {
        let calls = AtomicU32::new(0);

        let result: TrackerResult<()> = fast_policy()
            .run("get_issue", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(TrackerError::Http {
                        status: 404,
                        message: "Not Found".into(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(TrackerError::Http { status: 404, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_means_single_attempt() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(0, Duration::from_millis(10));

        let result: TrackerResult<()> = policy
            .run("update_issue", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TrackerError::Transport("timed out".into())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
