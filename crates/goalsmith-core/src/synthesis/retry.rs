//! Bounded retry with exponential backoff.
//!
//! Each attempt reports an explicit [`AttemptOutcome`]; the loop reports a
//! [`RetryOutcome`]. Nothing here raises: exhausting the budget is an
//! ordinary value the caller turns into a fallback.

use std::future::Future;
use std::time::Duration;

/// Default number of attempts per request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff unit. Attempt `n` waits `unit * 2^n` before the next one.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// How many times to try, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_unit: Duration,
}

impl RetryPolicy {
    /// Build a policy. `max_attempts` is clamped to at least 1.
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_unit,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff_unit(&self) -> Duration {
        self.backoff_unit
    }

    /// Delay after failed attempt `attempt` (0-based): `unit * 2^attempt`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_unit
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Upper bound on total sleep when every attempt fails. No sleep follows
    /// the final attempt.
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_attempts.saturating_sub(1))
            .map(|attempt| self.backoff_for(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BACKOFF_UNIT)
    }
}

/// Result of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome<T> {
    /// The attempt produced a usable value.
    Parsed(T),
    /// The attempt failed and another one may succeed.
    Retryable(String),
}

/// Result of the whole retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    Parsed {
        value: T,
        attempts: u32,
    },
    /// Every attempt failed; the caller should fall back.
    Exhausted {
        attempts: u32,
        last_error: String,
    },
}

/// Run `attempt` until it yields [`AttemptOutcome::Parsed`] or the policy's
/// budget is spent.
///
/// `attempt` receives the 0-based attempt number. Attempts run strictly one
/// after another.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut attempt: F) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AttemptOutcome<T>>,
{
    let mut last_error = String::new();

    for n in 0..policy.max_attempts() {
        match attempt(n).await {
            AttemptOutcome::Parsed(value) => {
                return RetryOutcome::Parsed {
                    value,
                    attempts: n + 1,
                };
            }
            AttemptOutcome::Retryable(reason) => {
                tracing::warn!(
                    attempt = n + 1,
                    max_attempts = policy.max_attempts(),
                    "attempt failed: {reason}"
                );
                last_error = reason;
            }
        }

        if n + 1 < policy.max_attempts() {
            tokio::time::sleep(policy.backoff_for(n)).await;
        }
    }

    RetryOutcome::Exhausted {
        attempts: policy.max_attempts(),
        last_error,
    }
}
