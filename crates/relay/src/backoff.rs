//! Retry policy and backoff timing for the reliable publisher.
//!
//! The delay computation is a pure function of its inputs so that the
//! exponential growth, the ±25% jitter band, and the budget clamp can be tested
//! without sleeping. [`jittered_backoff`] is the only place randomness enters.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::PolicyError;

/// Lower edge of the jitter band, as a multiple of the un-jittered delay.
pub const JITTER_MIN: f64 = 0.75;

/// Width of the jitter band. `JITTER_MIN + JITTER_SPAN` is the upper edge (1.25).
pub const JITTER_SPAN: f64 = 0.5;

/// Caps the exponent so `base * 2^attempt` cannot overflow `Duration`.
const MAX_EXPONENT: u32 = 30;

/// Bounds on a single `publish_with_retry` call.
///
/// A call makes at most `max_retries` attempts and spends at most
/// `total_budget` (plus the duration of one in-flight attempt) doing so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishPolicy {
    max_retries: u32,
    retry_base_delay: Duration,
    total_budget: Duration,
}

impl PublishPolicy {
    /// Creates a policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] if `max_retries` is zero or `total_budget` is zero.
    /// A zero `retry_base_delay` is allowed and means "retry immediately".
    pub fn new(
        max_retries: u32,
        retry_base_delay: Duration,
        total_budget: Duration,
    ) -> Result<Self, PolicyError> {
        if max_retries == 0 {
            return Err(PolicyError {
                field: "max_retries",
                message: "at least one attempt is required".to_string(),
            });
        }
        if total_budget.is_zero() {
            return Err(PolicyError {
                field: "total_budget",
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            max_retries,
            retry_base_delay,
            total_budget,
        })
    }

    /// Maximum number of attempts, including the first.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the second attempt, before jitter; doubles thereafter.
    pub fn retry_base_delay(&self) -> Duration {
        self.retry_base_delay
    }

    /// Wall-clock budget shared by all attempts and backoff sleeps.
    pub fn total_budget(&self) -> Duration {
        self.total_budget
    }
}

impl Default for PublishPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_delay: Duration::from_millis(100),
            total_budget: Duration::from_millis(5_000),
        }
    }
}

/// Computes the sleep after failed attempt `attempt` (0-indexed).
///
/// `delay = base * 2^attempt * (0.75 + jitter * 0.5)`, clamped to `remaining`.
/// `jitter` is a sample from `[0, 1)`; values outside that range are clamped.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use relay::backoff_delay;
///
/// let base = Duration::from_millis(100);
/// let plenty = Duration::from_secs(10);
///
/// // Midpoint jitter leaves the exponential value untouched.
/// assert_eq!(backoff_delay(2, base, plenty, 0.5), Duration::from_millis(400));
///
/// // Never longer than what is left of the budget.
/// assert_eq!(backoff_delay(2, base, Duration::from_millis(50), 0.5), Duration::from_millis(50));
/// ```
pub fn backoff_delay(attempt: u32, base: Duration, remaining: Duration, jitter: f64) -> Duration {
    let jitter = if jitter.is_finite() {
        jitter.clamp(0.0, 1.0)
    } else {
        0.5
    };

    let exponent = attempt.min(MAX_EXPONENT);
    let factor = f64::from(1u32 << exponent) * (JITTER_MIN + jitter * JITTER_SPAN);
    let nanos = (base.as_nanos() as f64 * factor).round();
    let delay = if nanos >= u64::MAX as f64 {
        Duration::MAX
    } else {
        Duration::from_nanos(nanos as u64)
    };

    delay.min(remaining)
}

/// [`backoff_delay`] with a fresh jitter sample from the thread-local RNG.
pub fn jittered_backoff(attempt: u32, base: Duration, remaining: Duration) -> Duration {
    let jitter: f64 = rand::rng().random();
    backoff_delay(attempt, base, remaining, jitter)
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
