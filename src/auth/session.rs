use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{ApiError, Result};
use crate::http::transport::{BlockingTransport, Transport};

use super::authenticator::PkceAuthenticator;
use super::store::TokenStore;
use super::token::TokenInfo;

/// Result of inspecting the stored token without touching the network.
enum Stored {
    Valid(TokenInfo),
    /// Carries the stale token so a waiter can tell whether it was replaced.
    NeedsRefresh(TokenInfo),
}

/// Authenticator plus token storage, shared by every request of a client.
///
/// Refreshes are serialized: when several in-flight requests find the token
/// expired at the same time, one of them refreshes and the others reuse the
/// stored result.
pub struct AuthSession {
    authenticator: PkceAuthenticator,
    store: Arc<dyn TokenStore>,
    refresh_guard: Mutex<()>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticator", &self.authenticator)
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    pub fn new(authenticator: PkceAuthenticator, store: Arc<dyn TokenStore>) -> Self {
        Self {
            authenticator,
            store,
            refresh_guard: Mutex::new(()),
        }
    }

    pub fn authenticator(&self) -> &PkceAuthenticator {
        &self.authenticator
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// The stored token, expired or not.
    pub fn token(&self) -> Result<Option<TokenInfo>> {
        self.store.load()
    }

    /// Whether a request could be authenticated right now, possibly after a refresh.
    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self
            .store
            .load()?
            .map(|token| !token.is_expired() || token.can_refresh())
            .unwrap_or(false))
    }

    pub fn set_token(&self, token: &TokenInfo) -> Result<()> {
        self.store.store(token)?;
        tracing::info!("stored access token");
        Ok(())
    }

    pub fn clear_token(&self) -> Result<()> {
        self.store.clear()?;
        tracing::info!("cleared stored token");
        Ok(())
    }

    pub async fn exchange_code(
        &self,
        transport: &dyn Transport,
        code: &str,
        verifier: &str,
    ) -> Result<TokenInfo> {
        let token = self
            .authenticator
            .exchange_code(transport, code, verifier)
            .await?;
        self.set_token(&token)?;
        Ok(token)
    }

    pub fn exchange_code_blocking(
        &self,
        transport: &dyn BlockingTransport,
        code: &str,
        verifier: &str,
    ) -> Result<TokenInfo> {
        let token = self
            .authenticator
            .exchange_code_blocking(transport, code, verifier)?;
        self.set_token(&token)?;
        Ok(token)
    }

    /// Refresh unconditionally and store the result.
    pub async fn refresh(&self, transport: &dyn Transport) -> Result<TokenInfo> {
        let _guard = self.refresh_guard.lock().await;
        let current = self.load_required()?;
        let token = self.authenticator.refresh(transport, &current).await?;
        self.set_token(&token)?;
        Ok(token)
    }

    pub fn refresh_blocking(&self, transport: &dyn BlockingTransport) -> Result<TokenInfo> {
        let _guard = self.refresh_guard.blocking_lock();
        let current = self.load_required()?;
        let token = self.authenticator.refresh_blocking(transport, &current)?;
        self.set_token(&token)?;
        Ok(token)
    }

    /// A token valid for the next request, refreshing it if needed.
    ///
    /// Fails with `Authentication` without any network call when there is no
    /// token, or when it is expired and has no refresh token.
    pub async fn resolve_token(&self, transport: &dyn Transport) -> Result<TokenInfo> {
        let stale = match self.inspect()? {
            Stored::Valid(token) => return Ok(token),
            Stored::NeedsRefresh(stale) => stale,
        };

        let _guard = self.refresh_guard.lock().await;
        let current = match self.recheck(&stale)? {
            Stored::Valid(token) => return Ok(token),
            Stored::NeedsRefresh(current) => current,
        };
        tracing::debug!("access token expired, refreshing");
        let token = self.authenticator.refresh(transport, &current).await?;
        self.set_token(&token)?;
        Ok(token)
    }

    /// Blocking counterpart of [`resolve_token`](Self::resolve_token).
    ///
    /// Must not be called from inside an async runtime.
    pub fn resolve_token_blocking(&self, transport: &dyn BlockingTransport) -> Result<TokenInfo> {
        let stale = match self.inspect()? {
            Stored::Valid(token) => return Ok(token),
            Stored::NeedsRefresh(stale) => stale,
        };

        let _guard = self.refresh_guard.blocking_lock();
        let current = match self.recheck(&stale)? {
            Stored::Valid(token) => return Ok(token),
            Stored::NeedsRefresh(current) => current,
        };
        tracing::debug!("access token expired, refreshing");
        let token = self.authenticator.refresh_blocking(transport, &current)?;
        self.set_token(&token)?;
        Ok(token)
    }

    fn inspect(&self) -> Result<Stored> {
        let token = self.load_required()?;
        if !token.is_expired() {
            return Ok(Stored::Valid(token));
        }
        if !token.can_refresh() {
            return Err(ApiError::authentication(
                "Token has expired and no refresh token is available. Please re-authenticate.",
            ));
        }
        Ok(Stored::NeedsRefresh(token))
    }

    /// Re-reads the store once the refresh guard is held.
    ///
    /// Any token other than `stale` was stored by a concurrent refresh or
    /// login and is used as is, even when it is already inside the expiry
    /// margin.
    fn recheck(&self, stale: &TokenInfo) -> Result<Stored> {
        let current = self.load_required()?;
        if current != *stale {
            tracing::debug!("reusing token refreshed by a concurrent request");
            return Ok(Stored::Valid(current));
        }
        Ok(Stored::NeedsRefresh(current))
    }

    fn load_required(&self) -> Result<TokenInfo> {
        self.store.load()?.ok_or_else(|| {
            ApiError::authentication("No token available. Please authenticate first.")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::http::transport::{TransportRequest, TransportResponse};
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        calls: AtomicUsize,
        body: &'static str,
        delay: std::time::Duration,
    }

    impl BlockingTransport for CountingTransport {
        fn send(&self, _request: TransportRequest) -> Result<TransportResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            Ok(TransportResponse::new(200, self.body))
        }
    }

    fn transport(body: &'static str) -> CountingTransport {
        CountingTransport {
            calls: AtomicUsize::new(0),
            body,
            delay: std::time::Duration::ZERO,
        }
    }

    fn expired(refresh: Option<&str>) -> TokenInfo {
        let token =
            TokenInfo::new("stale", 3600).with_obtained_at(Utc::now() - Duration::seconds(3700));
        match refresh {
            Some(refresh) => token.with_refresh_token(refresh),
            None => token,
        }
    }

    fn session(token: Option<TokenInfo>) -> AuthSession {
        let store = match token {
            Some(token) => MemoryTokenStore::with_token(token),
            None => MemoryTokenStore::new(),
        };
        AuthSession::new(PkceAuthenticator::new("client"), Arc::new(store))
    }

    #[test]
    fn valid_token_is_returned_without_network() {
        let transport = transport("{}");
        let session = session(Some(TokenInfo::new("fresh", 3600)));
        let token = session.resolve_token_blocking(&transport).unwrap();
        assert_eq!(token.access_token, "fresh");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_token_fails_before_network() {
        let transport = transport("{}");
        let err = session(None).resolve_token_blocking(&transport).unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn expired_without_refresh_token_fails_before_network() {
        let transport = transport("{}");
        let err = session(Some(expired(None)))
            .resolve_token_blocking(&transport)
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn expired_token_is_refreshed_and_stored() {
        let transport = transport(r#"{"access_token":"renewed","refresh_token":"rt2"}"#);
        let session = session(Some(expired(Some("rt1"))));
        let token = session.resolve_token_blocking(&transport).unwrap();

        assert_eq!(token.access_token, "renewed");
        let stored = session.token().unwrap().unwrap();
        assert_eq!(stored.access_token, "renewed");
        assert_eq!(stored.refresh_token.as_deref(), Some("rt2"));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn is_authenticated_reflects_refreshability() {
        assert!(!session(None).is_authenticated().unwrap());
        assert!(!session(Some(expired(None))).is_authenticated().unwrap());
        assert!(session(Some(expired(Some("rt")))).is_authenticated().unwrap());
        assert!(session(Some(TokenInfo::new("a", 3600)))
            .is_authenticated()
            .unwrap());
    }

    #[test]
    fn short_lived_token_is_refreshed_once_for_concurrent_waiters() {
        let transport = Arc::new(CountingTransport {
            calls: AtomicUsize::new(0),
            body: r#"{"access_token":"shared","expires_in":30}"#,
            delay: std::time::Duration::from_millis(100),
        });
        let session = Arc::new(session(Some(expired(Some("rt1")))));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let session = session.clone();
                let transport = transport.clone();
                std::thread::spawn(move || session.resolve_token_blocking(transport.as_ref()))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap().access_token, "shared");
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }
}
