//! Caller-side cancellation: an optional token plus an optional time budget.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::ApiError;

/// Cancellation handle passed to `execute_with`.
///
/// Both parts are optional. The time budget covers the whole logical
/// request, including backoff waits between attempts.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use euroleague::util::cancel::Cancellation;
/// use tokio_util::sync::CancellationToken;
///
/// let token = CancellationToken::new();
/// let cancel = Cancellation::new()
///     .with_token(token.clone())
///     .with_timeout(Duration::from_secs(10));
/// token.cancel();
/// assert!(cancel.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    token: Option<CancellationToken>,
    timeout: Option<Duration>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn token(&self) -> Option<&CancellationToken> {
        self.token.as_ref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether anything can interrupt the request.
    pub fn is_active(&self) -> bool {
        self.token.is_some() || self.timeout.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token
            .as_ref()
            .map(CancellationToken::is_cancelled)
            .unwrap_or(false)
    }

    /// Instant at which the time budget runs out, counted from `now`.
    ///
    /// A budget too large to represent means no deadline at all.
    pub fn deadline_from(&self, now: Instant) -> Option<Instant> {
        self.timeout.and_then(|budget| now.checked_add(budget))
    }

    pub(crate) fn cancelled_error() -> ApiError {
        ApiError::Cancelled("cancelled by caller".to_string())
    }

    pub(crate) fn deadline_error(&self) -> ApiError {
        let millis = self.timeout.map(|t| t.as_millis()).unwrap_or_default();
        ApiError::Cancelled(format!("deadline of {millis}ms elapsed"))
    }
}
