//! Non-blocking request executor.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::auth::AuthSession;
use crate::error::{ApiError, Result};
use crate::util::cancel::Cancellation;
use crate::util::retry::{RetryContext, RetryPolicy};

use super::attempt::{after_attempt, Step};
use super::classify::{classify, ParsedResponse};
use super::request::ApiRequest;
use super::transport::Transport;

/// Runs [`ApiRequest`]s with token resolution, classification and retries.
///
/// Suspends only at the transport call and at backoff sleeps. Attempts of
/// one request are strictly sequential.
#[derive(Clone)]
pub struct RequestExecutor {
    base_url: String,
    timeout: Duration,
    policy: RetryPolicy,
    transport: Arc<dyn Transport>,
    session: Option<Arc<AuthSession>>,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("policy", &self.policy)
            .field("authenticated", &self.session.is_some())
            .finish()
    }
}

impl RequestExecutor {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        policy: RetryPolicy,
        transport: Arc<dyn Transport>,
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

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub async fn execute(&self, request: &ApiRequest) -> Result<ParsedResponse> {
        self.run(request).await
    }

    /// Like [`execute`](Self::execute), abandoning the call as soon as
    /// `cancel` fires or its time budget runs out, whether the request is
    /// waiting on the network or sleeping between attempts.
    pub async fn execute_with(
        &self,
        request: &ApiRequest,
        cancel: &Cancellation,
    ) -> Result<ParsedResponse> {
        if !cancel.is_active() {
            return self.run(request).await;
        }
        let token = cancel.token().cloned().unwrap_or_default();
        let deadline = cancel
            .deadline_from(Instant::now().into_std())
            .map(Instant::from_std);

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!(path = %request.path, "request cancelled by caller");
                Err(Cancellation::cancelled_error())
            }
            _ = sleep_until(deadline) => {
                tracing::debug!(path = %request.path, "request deadline elapsed");
                Err(cancel.deadline_error())
            }
            result = self.run(request) => result,
        }
    }

    async fn run(&self, request: &ApiRequest) -> Result<ParsedResponse> {
        let mut ctx = RetryContext::new(&self.policy);
        loop {
            let outcome = self.attempt(request).await;
            match after_attempt(&self.policy, &mut ctx, &request.path, outcome) {
                Step::Done(result) => return result,
                Step::Backoff(delay) => tokio::time::sleep(delay).await,
            }
        }
    }

    async fn attempt(&self, request: &ApiRequest) -> Result<ParsedResponse> {
        let authorization = if request.requires_auth {
            let session = self.session.as_ref().ok_or_else(|| {
                ApiError::authentication(
                    "Request requires authentication but no credentials are configured",
                )
            })?;
            Some(
                session
                    .resolve_token(self.transport.as_ref())
                    .await?
                    .authorization_header(),
            )
        } else {
            None
        };

        let raw = request.to_transport(&self.base_url, self.timeout, authorization.as_deref());
        let response = self.transport.send(raw).await?;
        classify(&response)
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
