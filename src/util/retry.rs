//! Retry decisions with exponential backoff and jitter.
//!
//! Everything here is pure: the executors own the sleeping, this module only
//! answers "retry?" and "how long to wait?".

use std::time::Duration;

use rand::Rng;

use crate::error::{ApiError, ErrorKind};

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each later attempt.
    pub base_delay: Duration,
    /// Upper bound for the computed (pre-jitter) backoff.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Per-request retry state. Created for each logical request and dropped
/// once it succeeds or attempts are exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryContext {
    /// 1-based number of the attempt that just ran (or is about to run).
    pub attempt_number: u32,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub last_error_kind: Option<ErrorKind>,
    /// Provider-supplied delay from the last rate-limit response.
    pub retry_after: Option<Duration>,
}

impl RetryContext {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt_number: 1,
            max_attempts: policy.max_attempts,
            base_delay: policy.base_delay,
            last_error_kind: None,
            retry_after: None,
        }
    }

    pub fn record_failure(&mut self, error: &ApiError) {
        self.last_error_kind = Some(error.kind());
        self.retry_after = error.retry_after();
    }

    pub fn advance(&mut self) {
        self.attempt_number = self.attempt_number.saturating_add(1);
    }

    pub fn attempts_remaining(&self) -> bool {
        self.attempt_number < self.max_attempts
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then attempt again.
    Backoff(Duration),
    /// Surface the error to the caller.
    GiveUp,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Whether the attempt described by `ctx`, which failed with `kind`,
    /// should be followed by another one.
    pub fn should_retry(&self, ctx: &RetryContext, kind: ErrorKind) -> bool {
        kind.is_retryable() && ctx.attempts_remaining()
    }

    /// Wait before the attempt after `ctx.attempt_number`.
    ///
    /// A server-supplied `Retry-After` on a rate-limit error wins over the
    /// computed backoff; otherwise the backoff gets uniform jitter in
    /// `[0, backoff]`.
    pub fn delay_for(&self, ctx: &RetryContext) -> Duration {
        let unit = rand::thread_rng().gen_range(0.0..=1.0);
        self.delay_with_jitter(ctx, unit)
    }

    /// [`delay_for`](Self::delay_for) with the jitter draw supplied by the caller.
    /// `unit` is clamped to `[0, 1]`.
    pub fn delay_with_jitter(&self, ctx: &RetryContext, unit: f64) -> Duration {
        if ctx.last_error_kind == Some(ErrorKind::RateLimited) {
            if let Some(retry_after) = ctx.retry_after {
                return retry_after;
            }
        }
        let backoff = self.backoff(ctx.attempt_number);
        backoff.saturating_add(backoff.mul_f64(unit.clamp(0.0, 1.0)))
    }

    /// Exponential backoff without jitter: `base_delay * 2^(attempt - 1)`,
    /// capped at `max_delay`.
    pub fn backoff(&self, attempt_number: u32) -> Duration {
        let exponent = attempt_number.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Record `error` in `ctx` and decide whether to try again.
    pub fn decide(&self, ctx: &mut RetryContext, error: &ApiError) -> RetryDecision {
        ctx.record_failure(error);
        if self.should_retry(ctx, error.kind()) {
            RetryDecision::Backoff(self.delay_for(ctx))
        } else {
            RetryDecision::GiveUp
        }
    }
}
