//! Mode-independent step between attempts.
//!
//! A logical call moves `Pending -> Attempting <-> Backoff -> Succeeded | Failed`.
//! Both executors run the attempt themselves, hand the outcome to
//! [`after_attempt`] and only differ in how they wait out a [`Step::Backoff`].

use std::time::Duration;

use crate::error::Result;
use crate::util::retry::{RetryContext, RetryDecision, RetryPolicy};

use super::classify::ParsedResponse;

#[derive(Debug)]
pub(crate) enum Step {
    /// Terminal: `Succeeded` or `Failed`.
    Done(Result<ParsedResponse>),
    /// Wait, then run the next attempt.
    Backoff(Duration),
}

pub(crate) fn after_attempt(
    policy: &RetryPolicy,
    ctx: &mut RetryContext,
    path: &str,
    outcome: Result<ParsedResponse>,
) -> Step {
    let error = match outcome {
        Ok(response) => {
            tracing::debug!(
                path,
                attempt = ctx.attempt_number,
                status = response.status,
                "request succeeded"
            );
            return Step::Done(Ok(response));
        }
        Err(error) => error,
    };

    match policy.decide(ctx, &error) {
        RetryDecision::Backoff(delay) => {
            tracing::warn!(
                path,
                attempt = ctx.attempt_number,
                max_attempts = ctx.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "retrying request"
            );
            ctx.advance();
            Step::Backoff(delay)
        }
        RetryDecision::GiveUp => {
            tracing::debug!(
                path,
                attempt = ctx.attempt_number,
                kind = ?error.kind(),
                "request failed"
            );
            Step::Done(Err(error))
        }
    }
}
