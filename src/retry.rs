//! Bounded retry with exponential backoff.
//!
//! Every upstream inference call goes through [`run_with_backoff`]. The
//! executor retries *every* failure up to the attempt budget; the
//! retryable/non-retryable classification it computes is recorded in logs
//! only and never short-circuits the loop. Callers receive an explicit
//! [`Exhausted`] value when the budget is spent so they can select a
//! deterministic fallback instead of propagating a raw error.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::error::{AppError, AppResult};

/// Hard ceiling on configured attempts.
pub const MAX_ATTEMPT_LIMIT: u32 = 10;

/// Hard ceiling on the configured initial delay.
pub const MAX_INITIAL_DELAY: Duration = Duration::from_secs(60);

/// Substrings in an error's text that mark it as upstream overload.
const OVERLOAD_MARKERS: [&str; 4] = ["503", "429", "overloaded", "UNAVAILABLE"];

/// Immutable retry configuration.
///
/// The delay before attempt `i + 1` is `initial_delay * 2^(i - 1)` for the
/// 1-based attempt `i` that just failed: 2s, 4s, 8s, ... with the defaults.
/// No jitter. No delay is scheduled after the final attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(2000);

    /// Creates a policy, rejecting values that would make the doubling
    /// arithmetic or the total wait unreasonable.
    pub fn new(max_attempts: u32, initial_delay: Duration) -> AppResult<Self> {
        if max_attempts == 0 {
            return Err(AppError::Config(
                "retry max_attempts must be at least 1".to_string(),
            ));
        }
        if max_attempts > MAX_ATTEMPT_LIMIT {
            return Err(AppError::Config(format!(
                "retry max_attempts must be at most {MAX_ATTEMPT_LIMIT}, got {max_attempts}"
            )));
        }
        if initial_delay > MAX_INITIAL_DELAY {
            return Err(AppError::Config(format!(
                "retry initial delay must be at most {}ms, got {}ms",
                MAX_INITIAL_DELAY.as_millis(),
                initial_delay.as_millis()
            )));
        }
        Ok(Self {
            max_attempts,
            initial_delay,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Delay scheduled after the 1-based `attempt` fails.
    ///
    /// Only meaningful for `attempt < max_attempts`; the executor never asks
    /// for a delay after the final attempt.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_ATTEMPT_LIMIT);
        self.initial_delay.saturating_mul(2u32.pow(exponent))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
        }
    }
}

/// Where a failure sits in the retry log taxonomy.
///
/// `Overloaded` covers provider overload and rate limiting. Everything else
/// is `Other`. Both classes are retried identically; the split exists so
/// operators can tell capacity problems from genuine faults in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Overloaded,
    Other,
}

impl FailureClass {
    /// Classifies an error by its provider status code, falling back to
    /// scanning its display text for overload markers.
    pub fn of<E>(error: &E) -> Self
    where
        E: ProviderStatus + fmt::Display,
    {
        if matches!(error.provider_status(), Some(503) | Some(429)) {
            return Self::Overloaded;
        }
        let text = error.to_string();
        if OVERLOAD_MARKERS.iter().any(|marker| text.contains(marker)) {
            Self::Overloaded
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overloaded => "overloaded",
            Self::Other => "other",
        }
    }
}

/// Implemented by errors that may carry a provider-assigned HTTP status.
pub trait ProviderStatus {
    fn provider_status(&self) -> Option<u16> {
        None
    }
}

/// Terminal result of a retry loop whose every attempt failed.
///
/// Returned as a value rather than bubbled through `?` so callers make an
/// explicit decision at the exhaustion point.
#[derive(Debug, Error)]
#[error("all {attempts} attempts failed ({}): {last_error}", .class.as_str())]
pub struct Exhausted<E>
where
    E: fmt::Display + fmt::Debug,
{
    pub attempts: u32,
    pub class: FailureClass,
    pub last_error: E,
}

/// Outcome of a single attempt inside the loop.
enum AttemptOutcome<T, E> {
    Success(T),
    Failure { class: FailureClass, error: E },
}

/// Runs `operation` up to `policy.max_attempts()` times, sleeping between
/// attempts per the policy.
///
/// The operation is invoked sequentially, never concurrently; each call
/// produces a fresh future. The sleep is a tokio timer, so concurrent
/// requests are unaffected, and dropping the returned future mid-wait
/// cancels both the pending timer and any further attempts.
pub async fn run_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, Exhausted<E>>
where
    E: ProviderStatus + fmt::Display + fmt::Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        let outcome = match operation().await {
            Ok(value) => AttemptOutcome::Success(value),
            Err(error) => AttemptOutcome::Failure {
                class: FailureClass::of(&error),
                error,
            },
        };

        match outcome {
            AttemptOutcome::Success(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, max_attempts, "upstream call succeeded after retry");
                }
                return Ok(value);
            }
            AttemptOutcome::Failure { class, error } => {
                if attempt >= max_attempts {
                    tracing::error!(
                        attempts = max_attempts,
                        class = class.as_str(),
                        error = %error,
                        "all retry attempts exhausted"
                    );
                    return Err(Exhausted {
                        attempts: max_attempts,
                        class,
                        last_error: error,
                    });
                }

                let delay = policy.delay_after(attempt);
                match class {
                    FailureClass::Overloaded => tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "upstream overloaded, retrying after backoff"
                    ),
                    FailureClass::Other => tracing::warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "upstream call failed, retrying after backoff"
                    ),
                }

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
