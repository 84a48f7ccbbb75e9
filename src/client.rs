//! High-level clients owning the connection pool, auth session and executor.

use std::sync::Arc;

use serde_json::Value;

use crate::auth::{
    AuthSession, AuthorizationRequest, FileTokenStore, PkceAuthenticator, TokenInfo, TokenStore,
};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{
    ApiRequest, BlockingRequestExecutor, BlockingReqwestTransport, BlockingTransport,
    ParsedResponse, RequestExecutor, ReqwestTransport, Transport,
};
use crate::util::cancel::Cancellation;

/// Async Euroleague API client.
///
/// The connection pool is created here and released when the client is
/// closed or dropped.
///
/// # Example
/// ```no_run
/// use euroleague::api::v1;
/// use euroleague::EuroleagueClient;
///
/// # async fn run() -> euroleague::error::Result<()> {
/// let client = EuroleagueClient::from_env()?;
/// let game = client.execute(&v1::game("E2024", 1)).await?;
/// println!("{}", game.body);
/// client.close();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EuroleagueClient {
    config: ClientConfig,
    session: Arc<AuthSession>,
    executor: RequestExecutor,
}

impl EuroleagueClient {
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Self::with_transport(config, store, Arc::new(transport))
    }

    /// Build a client over a custom transport.
    pub fn with_transport(
        config: ClientConfig,
        store: Arc<dyn TokenStore>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let config = config.validate()?;
        let session = Arc::new(AuthSession::new(
            PkceAuthenticator::from_config(&config),
            store,
        ));
        let executor = RequestExecutor::new(
            config.base_url.clone(),
            config.timeout,
            config.retry.clone(),
            transport,
        )
        .with_session(session.clone());
        tracing::debug!(base_url = %config.base_url, "created async client");
        Ok(Self {
            config,
            session,
            executor,
        })
    }

    /// Config from `EUROLEAGUE_*` variables, token in `~/.euroleague/token.json`.
    pub fn from_env() -> Result<Self> {
        Self::new(
            ClientConfig::from_env()?,
            Arc::new(FileTokenStore::new_default()),
        )
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub fn begin_authorization(&self, scopes: Option<&[&str]>) -> Result<AuthorizationRequest> {
        self.session.authenticator().begin_authorization(scopes)
    }

    /// Exchange an authorization code and store the resulting token.
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenInfo> {
        self.session
            .exchange_code(self.executor.transport().as_ref(), code, verifier)
            .await
    }

    pub async fn refresh_token(&self) -> Result<TokenInfo> {
        self.session
            .refresh(self.executor.transport().as_ref())
            .await
    }

    pub fn token(&self) -> Result<Option<TokenInfo>> {
        self.session.token()
    }

    pub fn is_authenticated(&self) -> Result<bool> {
        self.session.is_authenticated()
    }

    pub fn set_token(&self, token: &TokenInfo) -> Result<()> {
        self.session.set_token(token)
    }

    pub fn clear_token(&self) -> Result<()> {
        self.session.clear_token()
    }

    pub async fn execute(&self, request: &ApiRequest) -> Result<ParsedResponse> {
        self.executor.execute(request).await
    }

    pub async fn execute_with(
        &self,
        request: &ApiRequest,
        cancel: &Cancellation,
    ) -> Result<ParsedResponse> {
        self.executor.execute_with(request, cancel).await
    }

    /// Authenticated GET returning only the JSON body.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let request = query
            .iter()
            .fold(ApiRequest::get(path), |req, (k, v)| req.query(*k, v));
        Ok(self.execute(&request).await?.body)
    }

    /// Release the connection pool. Equivalent to dropping the client.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for EuroleagueClient {
    fn drop(&mut self) {
        tracing::debug!("closing async client");
    }
}

/// Blocking Euroleague API client.
///
/// Create, use and drop it outside of any async runtime.
#[derive(Debug)]
pub struct BlockingEuroleagueClient {
    config: ClientConfig,
    session: Arc<AuthSession>,
    executor: BlockingRequestExecutor,
}

impl BlockingEuroleagueClient {
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let transport = BlockingReqwestTransport::new(config.timeout)?;
        Self::with_transport(config, store, Arc::new(transport))
    }

    pub fn with_transport(
        config: ClientConfig,
        store: Arc<dyn TokenStore>,
        transport: Arc<dyn BlockingTransport>,
    ) -> Result<Self> {
        let config = config.validate()?;
        let session = Arc::new(AuthSession::new(
            PkceAuthenticator::from_config(&config),
            store,
        ));
        let executor = BlockingRequestExecutor::new(
            config.base_url.clone(),
            config.timeout,
            config.retry.clone(),
            transport,
        )
        .with_session(session.clone());
        tracing::debug!(base_url = %config.base_url, "created blocking client");
        Ok(Self {
            config,
            session,
            executor,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(
            ClientConfig::from_env()?,
            Arc::new(FileTokenStore::new_default()),
        )
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub fn begin_authorization(&self, scopes: Option<&[&str]>) -> Result<AuthorizationRequest> {
        self.session.authenticator().begin_authorization(scopes)
    }

    pub fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenInfo> {
        self.session
            .exchange_code_blocking(self.executor.transport().as_ref(), code, verifier)
    }

    pub fn refresh_token(&self) -> Result<TokenInfo> {
        self.session
            .refresh_blocking(self.executor.transport().as_ref())
    }

    pub fn token(&self) -> Result<Option<TokenInfo>> {
        self.session.token()
    }

    pub fn is_authenticated(&self) -> Result<bool> {
        self.session.is_authenticated()
    }

    pub fn set_token(&self, token: &TokenInfo) -> Result<()> {
        self.session.set_token(token)
    }

    pub fn clear_token(&self) -> Result<()> {
        self.session.clear_token()
    }

    pub fn execute(&self, request: &ApiRequest) -> Result<ParsedResponse> {
        self.executor.execute(request)
    }

    pub fn execute_with(&self, request: &ApiRequest, cancel: &Cancellation) -> Result<ParsedResponse> {
        self.executor.execute_with(request, cancel)
    }

    pub fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let request = query
            .iter()
            .fold(ApiRequest::get(path), |req, (k, v)| req.query(*k, v));
        Ok(self.execute(&request)?.body)
    }

    pub fn close(self) {
        drop(self);
    }
}

impl Drop for BlockingEuroleagueClient {
    fn drop(&mut self) {
        tracing::debug!("closing blocking client");
    }
}
