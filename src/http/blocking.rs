//! Blocking request executor.
//!
//! Same decision logic as [`RequestExecutor`](super::RequestExecutor); the
//! calling thread is occupied for the whole call, backoff sleeps included.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::auth::AuthSession;
use crate::error::{ApiError, Result};
use crate::util::cancel::Cancellation;
use crate::util::retry::{RetryContext, RetryPolicy};

use super::attempt::{after_attempt, Step};
use super::classify::{classify, ParsedResponse};
use super::request::ApiRequest;
use super::transport::BlockingTransport;

/// Granularity at which a blocked caller notices cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Clone)]
pub struct BlockingRequestExecutor {
    base_url: String,
    timeout: Duration,
    policy: RetryPolicy,
    transport: Arc<dyn BlockingTransport>,
    session: Option<Arc<AuthSession>>,
}

impl std::fmt::Debug for BlockingRequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingRequestExecutor")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("policy", &self.policy)
            .field("authenticated", &self.session.is_some())
            .finish()
    }
}

impl BlockingRequestExecutor {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        policy: RetryPolicy,
        transport: Arc<dyn BlockingTransport>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
            policy,
            transport,
            session: None,
        }
    }

    pub fn with_session(mut self, session: Arc<AuthSession>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &Arc<dyn BlockingTransport> {
        &self.transport
    }

    pub fn execute(&self, request: &ApiRequest) -> Result<ParsedResponse> {
        self.execute_with(request, &Cancellation::default())
    }

    /// Like [`execute`](Self::execute), honoring `cancel` during network
    /// waits and backoff sleeps.
    ///
    /// With an active cancellation each attempt runs on a helper thread so
    /// the caller can stop waiting for it; the abandoned attempt finishes in
    /// the background and its result is discarded.
    pub fn execute_with(&self, request: &ApiRequest, cancel: &Cancellation) -> Result<ParsedResponse> {
        let deadline = cancel.deadline_from(Instant::now());
        let mut ctx = RetryContext::new(&self.policy);
        loop {
            let outcome = if cancel.is_active() {
                check_interrupt(cancel, deadline)?;
                self.attempt_interruptible(request, cancel, deadline)?
            } else {
                self.attempt(request)
            };
            match after_attempt(&self.policy, &mut ctx, &request.path, outcome) {
                Step::Done(result) => return result,
                Step::Backoff(delay) => sleep_interruptible(delay, cancel, deadline)?,
            }
        }
    }

    fn attempt(&self, request: &ApiRequest) -> Result<ParsedResponse> {
        let authorization = match (&self.session, request.requires_auth) {
            (_, false) => None,
            (Some(session), true) => Some(
                session
                    .resolve_token_blocking(self.transport.as_ref())?
                    .authorization_header(),
            ),
            (None, true) => {
                return Err(ApiError::authentication(
                    "Request requires authentication but no credentials are configured",
                ))
            }
        };

        let raw = request.to_transport(&self.base_url, self.timeout, authorization.as_deref());
        let response = self.transport.send(raw)?;
        classify(&response)
    }

    /// Outer `Err` means the caller gave up; the inner result is the attempt's.
    fn attempt_interruptible(
        &self,
        request: &ApiRequest,
        cancel: &Cancellation,
        deadline: Option<Instant>,
    ) -> Result<Result<ParsedResponse>> {
        let (tx, rx) = mpsc::channel();
        let worker = self.clone();
        let request = request.clone();
        thread::Builder::new()
            .name("euroleague-request".to_string())
            .spawn(move || {
                let _ = tx.send(worker.attempt(&request));
            })?;

        loop {
            check_interrupt(cancel, deadline)?;
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(outcome) => return Ok(outcome),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ApiError::transport(
                        "request worker exited without a result",
                    ))
                }
            }
        }
    }
}

fn check_interrupt(cancel: &Cancellation, deadline: Option<Instant>) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Cancellation::cancelled_error());
    }
    if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
        return Err(cancel.deadline_error());
    }
    Ok(())
}

fn sleep_interruptible(
    delay: Duration,
    cancel: &Cancellation,
    deadline: Option<Instant>,
) -> Result<()> {
    if !cancel.is_active() {
        thread::sleep(delay);
        return Ok(());
    }
    // An unrepresentable wake time never arrives; only an interrupt ends it.
    let wake_at = Instant::now().checked_add(delay);
    loop {
        check_interrupt(cancel, deadline)?;
        let remaining = match wake_at {
            Some(wake_at) => wake_at.saturating_duration_since(Instant::now()),
            None => POLL_INTERVAL,
        };
        if remaining.is_zero() {
            return Ok(());
        }
        thread::sleep(remaining.min(POLL_INTERVAL));
    }
}
