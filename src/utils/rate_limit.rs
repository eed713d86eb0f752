// src/utils/rate_limit.rs

//! Post-call request pacing.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;

/// Pauses for a fixed delay after every successful call.
///
/// This bounds the request cadence of one client instance. It is not a
/// token bucket: separate instances are not throttled against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiter {
    delay: Duration,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Await `operation`; on success pause before handing back the value.
    pub async fn run<T, Fut>(&self, operation: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let value = operation.await?;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(value)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_millis(1000)
    }
}
