use std::future::Future;
use std::time::Duration;
use tracing::info;

/// How often, and how many times, to re-check a condition that settles
/// asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fixed pause between two consecutive checks
    pub interval: Duration,

    /// Total number of checks, including the first one
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            max_attempts: 5,
        }
    }
}

/// Result of a [`poll_until`] loop that did not error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The check reported the condition held on the given attempt
    Settled { attempts: u32 },
    /// Every attempt ran without the condition holding
    Exhausted { attempts: u32 },
}

/// Call `check` until it returns `Ok(true)` or the attempt budget runs out.
///
/// The loop sleeps `policy.interval` between attempts but never after the
/// last one. An `Err` from `check` ends the loop immediately and is returned
/// as-is; errors are never retried.
pub async fn poll_until<F, Fut, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut check: F,
) -> Result<PollOutcome, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    for attempt in 1..=policy.max_attempts {
        if check().await? {
            return Ok(PollOutcome::Settled { attempts: attempt });
        }

        if attempt < policy.max_attempts {
            info!(
                "Condition not met for {} (attempt {}/{}), next check in {:?}",
                operation_name, attempt, policy.max_attempts, policy.interval
            );
            tokio::time::sleep(policy.interval).await;
        }
    }

    Ok(PollOutcome::Exhausted {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[derive(Debug, Clone)]
    struct TestError {
        message: String,
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.message)
        }
    }

    impl std::error::Error for TestError {}

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(Duration::from_secs(60), max_attempts)
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(60));
        assert_eq!(policy.max_attempts, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settles_on_first_attempt_without_sleeping() {
        let start = Instant::now();
        let outcome = poll_until(&policy(3), "test_operation", || async {
            Ok::<bool, TestError>(true)
        })
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::Settled { attempts: 1 });
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settles_after_retries() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);
        let start = Instant::now();

        let outcome = poll_until(&policy(5), "test_operation", move || {
            let counter = Arc::clone(&counter_clone);
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok::<bool, TestError>(count == 3)
            }
        })
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::Settled { attempts: 3 });
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(120) && elapsed < Duration::from_secs(121));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_does_not_sleep_after_last_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);
        let start = Instant::now();

        let outcome = poll_until(&policy(4), "test_operation", move || {
            let counter = Arc::clone(&counter_clone);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<bool, TestError>(false)
            }
        })
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::Exhausted { attempts: 4 });
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(180) && elapsed < Duration::from_secs(181));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_stops_polling() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let result = poll_until(&policy(5), "test_operation", move || {
            let counter = Arc::clone(&counter_clone);
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if count == 2 {
                    Err(TestError {
                        message: "access denied".to_string(),
                    })
                } else {
                    Ok(false)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap_err().message, "access denied");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_never_checks() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = Arc::clone(&counter);

        let outcome = poll_until(&policy(0), "test_operation", move || {
            let counter = Arc::clone(&counter_clone);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<bool, TestError>(true)
            }
        })
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::Exhausted { attempts: 0 });
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
