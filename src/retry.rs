//! Retry policy with exponential backoff for the inventory fetch.
//!
//! The backoff is a pure function of the 0-indexed attempt number, so the
//! schedule can be asserted in tests without waiting. Actual waiting goes
//! through the [`Sleeper`] trait; production code uses [`TokioSleeper`],
//! tests inject a recording implementation.

use std::time::Duration;

use async_trait::async_trait;

/// Default maximum total attempts (including the first).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Bounded-retry configuration for the inventory fetch.
///
/// # Delay Calculation
///
/// ```text
/// delay(attempt) = 2^attempt seconds
/// ```
///
/// where `attempt` is the 0-indexed attempt that just failed. With the
/// default of 3 attempts the waits are 1s and 2s before the second and
/// third attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with a custom attempt bound (clamped to >= 1).
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after the given failed attempt (0-indexed).
    ///
    /// Pure function of the attempt number: 1s, 2s, 4s, ...
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_secs(1u64.checked_shl(attempt).unwrap_or(u64::MAX))
    }
}

/// Abstraction over waiting, so retry behavior is testable without delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
