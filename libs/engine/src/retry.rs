use backoff::ExponentialBackoff;
use backoff::ExponentialBackoffBuilder;
use std::future::Future;
use std::time::Duration;

use crate::error::IngestError;

const RANDOMIZATION_FACTOR: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    /// Attempts are bounded by `max_attempts`, not by elapsed time.
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_delay)
            .with_max_interval(self.max_delay)
            .with_multiplier(f64::from(self.backoff_multiplier))
            .with_randomization_factor(RANDOMIZATION_FACTOR)
            .with_max_elapsed_time(None)
            .build()
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the attempts run out.
pub async fn retry_transient<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, IngestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, IngestError>>,
{
    let max_attempts = policy.max_attempts;
    let mut attempt: u32 = 0;

    backoff::future::retry_notify(
        policy.backoff(),
        || {
            attempt += 1;
            let current = attempt;
            let call = operation();
            async move {
                call.await.map_err(|e| {
                    if e.is_retryable() && current < max_attempts {
                        backoff::Error::transient(e)
                    } else {
                        backoff::Error::permanent(e)
                    }
                })
            }
        },
        |e: IngestError, delay: Duration| {
            tracing::warn!("Retry of [{label}] in {delay:?} - reason {e}");
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_follows_the_policy() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
            backoff_multiplier: 3,
        };
        let backoff = policy.backoff();

        assert_eq!(backoff.initial_interval, Duration::from_millis(100));
        assert_eq!(backoff.max_interval, Duration::from_millis(500));
        assert_eq!(backoff.multiplier, 3.0);
        assert_eq!(backoff.randomization_factor, RANDOMIZATION_FACTOR);
        assert_eq!(backoff.max_elapsed_time, None);
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_multiplier: 2,
        }
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry_transient(&fast_policy(5), "insert", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(IngestError::StoreUnavailable(sqlx::Error::PoolTimedOut))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.ok(), Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_transient(&fast_policy(3), "insert", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(IngestError::StoreUnavailable(sqlx::Error::PoolTimedOut))
        })
        .await;

        assert!(matches!(result, Err(IngestError::StoreUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_terminal_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_transient(&fast_policy(5), "insert", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(IngestError::InvalidInput("bad amount".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn single_attempt_policy_does_not_retry() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_transient(&RetryPolicy::none(), "read", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(IngestError::StoreUnavailable(sqlx::Error::PoolTimedOut))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
