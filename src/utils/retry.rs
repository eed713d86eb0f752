// src/utils/retry.rs

//! Retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Upper bound on a single backoff pause.
const MAX_BACKOFF_SECS: f64 = 300.0;

/// How often and how patiently to retry a failing operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    pub max_retries: u32,
    /// Pause before retry `n` (0-based) is `backoff_factor^n` seconds
    pub backoff_factor: f64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            backoff_factor,
        }
    }

    /// Pause after the failed attempt number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let secs = self
            .backoff_factor
            .powi(attempt.min(i32::MAX as u32) as i32)
            .min(MAX_BACKOFF_SECS);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 2.0)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are used up.
///
/// The error of the last attempt is returned unchanged.
pub async fn retry_with_backoff<T, F, Fut, P>(
    policy: &RetryPolicy,
    is_retryable: P,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&AppError) -> bool,
{
    let total = policy.max_retries + 1;
    let mut attempt = 0;

    loop {
        log::debug!("Attempt {}/{}", attempt + 1, total);

        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if !is_retryable(&error) {
            log::debug!("Attempt {}/{} failed permanently: {}", attempt + 1, total, error);
            return Err(error);
        }

        if attempt >= policy.max_retries {
            log::error!("All {} attempts failed: {}", total, error);
            return Err(error);
        }

        let delay = policy.delay_for(attempt);
        log::warn!(
            "Attempt {}/{} failed: {}. Retrying in {:.1}s...",
            attempt + 1,
            total,
            error,
            delay.as_secs_f64()
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_max_retries() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::new(2, 2.0);
        let started = tokio::time::Instant::now();

        let counter = Arc::clone(&attempts);
        let result: Result<()> = retry_with_backoff(&policy, AppError::is_retryable, || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AppError::RateLimited("booking".into()))
            }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(AppError::RateLimited(_))));
        // 2^0 + 2^1 seconds of backoff
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_fails_immediately() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::new(5, 2.0);

        let counter = Arc::clone(&attempts);
        let result: Result<()> = retry_with_backoff(&policy, AppError::is_retryable, || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AppError::authentication("expedia", "invalid client"))
            }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(AppError::Authentication { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_on_later_attempt() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::new(3, 2.0);

        let counter = Arc::clone(&attempts);
        let result = retry_with_backoff(&policy, AppError::is_retryable, || {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(AppError::Upstream {
                        source_name: "agoda".into(),
                        status: 502,
                    })
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_predicate() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::new(1, 1.0);

        let counter = Arc::clone(&attempts);
        let result: Result<()> = retry_with_backoff(
            &policy,
            |e| matches!(e, AppError::ReviewFetch { .. }),
            || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AppError::review_fetch("rakuten", "empty page"))
                }
            },
        )
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(result.is_err());
    }

    #[test]
    fn test_delay_for() {
        let policy = RetryPolicy::new(3, 2.0);
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(100), Duration::from_secs(300));
    }
}
