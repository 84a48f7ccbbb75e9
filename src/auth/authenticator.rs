//! OAuth2 authorization-code flow with PKCE.

use std::time::Duration;

use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;

use crate::config::{
    ClientConfig, DEFAULT_AUTH_URL, DEFAULT_REDIRECT_URI, DEFAULT_SCOPE, DEFAULT_TIMEOUT,
    DEFAULT_TOKEN_URL,
};
use crate::error::{ApiError, Result};
use crate::http::classify::status_to_error;
use crate::http::transport::{BlockingTransport, Transport, TransportRequest, TransportResponse};

use super::pkce::{states_match, PkceChallenge};
use super::token::{TokenInfo, TokenResponse};

/// Everything the caller must keep between sending the user to the
/// provider and receiving the redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
    pub verifier: String,
}

/// Builds authorization URLs and talks to the token endpoint.
///
/// It never persists anything; [`AuthSession`](super::AuthSession) owns storage.
///
/// # Example
/// ```
/// use euroleague::auth::PkceAuthenticator;
///
/// let auth = PkceAuthenticator::new("my-client");
/// let request = auth.begin_authorization(None)?;
/// assert!(request.url.contains("code_challenge_method=S256"));
/// # Ok::<(), euroleague::error::ApiError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PkceAuthenticator {
    client_id: String,
    redirect_uri: String,
    scope: String,
    auth_url: String,
    token_url: String,
    timeout: Duration,
}

impl PkceAuthenticator {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scope: config.scope.clone(),
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            timeout: config.timeout,
        }
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = uri.into();
        self
    }

    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Start an authorization attempt with a fresh random state.
    pub fn begin_authorization(&self, scopes: Option<&[&str]>) -> Result<AuthorizationRequest> {
        self.authorization_for(PkceChallenge::generate(), scopes)
    }

    /// Start an authorization attempt with a caller-chosen state.
    pub fn begin_authorization_with_state(
        &self,
        scopes: Option<&[&str]>,
        state: impl Into<String>,
    ) -> Result<AuthorizationRequest> {
        self.authorization_for(PkceChallenge::with_state(state), scopes)
    }

    fn authorization_for(
        &self,
        pkce: PkceChallenge,
        scopes: Option<&[&str]>,
    ) -> Result<AuthorizationRequest> {
        self.require_client_id()?;
        let scope = match scopes {
            Some(list) if !list.is_empty() => list.join(" "),
            _ => self.scope.clone(),
        };
        let url = url::Url::parse_with_params(
            &self.auth_url,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("state", pkce.state.as_str()),
                ("code_challenge", pkce.challenge.as_str()),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|err| {
            ApiError::Configuration(format!("auth_url is not a valid URL ({err}): {}", self.auth_url))
        })?;

        Ok(AuthorizationRequest {
            url: url.into(),
            state: pkce.state,
            verifier: pkce.verifier,
        })
    }

    /// Reject a callback whose `state` differs from the one we issued.
    pub fn validate_callback(expected_state: &str, returned_state: &str) -> Result<()> {
        if states_match(expected_state, returned_state) {
            Ok(())
        } else {
            Err(ApiError::authentication(
                "State mismatch in authorization callback",
            ))
        }
    }

    pub async fn exchange_code(
        &self,
        transport: &dyn Transport,
        code: &str,
        verifier: &str,
    ) -> Result<TokenInfo> {
        let request = self.code_exchange_request(code, verifier)?;
        let response = transport.send(request).await?;
        token_from_response(&response, None, "Token exchange")
    }

    pub fn exchange_code_blocking(
        &self,
        transport: &dyn BlockingTransport,
        code: &str,
        verifier: &str,
    ) -> Result<TokenInfo> {
        let request = self.code_exchange_request(code, verifier)?;
        let response = transport.send(request)?;
        token_from_response(&response, None, "Token exchange")
    }

    /// Exchange `token`'s refresh token for a new access token.
    pub async fn refresh(&self, transport: &dyn Transport, token: &TokenInfo) -> Result<TokenInfo> {
        let request = self.refresh_request(token)?;
        let response = transport.send(request).await?;
        token_from_response(&response, token.refresh_token.clone(), "Token refresh")
    }

    pub fn refresh_blocking(
        &self,
        transport: &dyn BlockingTransport,
        token: &TokenInfo,
    ) -> Result<TokenInfo> {
        let request = self.refresh_request(token)?;
        let response = transport.send(request)?;
        token_from_response(&response, token.refresh_token.clone(), "Token refresh")
    }

    fn code_exchange_request(&self, code: &str, verifier: &str) -> Result<TransportRequest> {
        self.require_client_id()?;
        if code.trim().is_empty() {
            return Err(ApiError::authentication("Authorization code is empty"));
        }
        Ok(self.token_request(vec![
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("code", code.trim()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("code_verifier", verifier),
        ]))
    }

    fn refresh_request(&self, token: &TokenInfo) -> Result<TransportRequest> {
        self.require_client_id()?;
        let refresh_token = token
            .refresh_token
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                ApiError::authentication("No refresh token available. Please re-authenticate.")
            })?;
        Ok(self.token_request(vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token),
        ]))
    }

    fn token_request(&self, form: Vec<(&str, &str)>) -> TransportRequest {
        TransportRequest::new(Method::POST, self.token_url.clone(), self.timeout)
            .header("Accept", "application/json")
            .form(
                form.into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            )
    }

    fn require_client_id(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(ApiError::Configuration(
                "client_id is required for OAuth (set EUROLEAGUE_CLIENT_ID)".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

fn token_from_response(
    response: &TransportResponse,
    previous_refresh: Option<String>,
    action: &str,
) -> Result<TokenInfo> {
    if response.status == 429 || response.status >= 500 {
        tracing::debug!(status = response.status, action, "token endpoint unavailable");
        return Err(status_to_error(response));
    }
    if !(200..300).contains(&response.status) {
        let reason = serde_json::from_slice::<TokenErrorBody>(&response.body)
            .ok()
            .and_then(|body| body.error_description.or(body.error))
            .unwrap_or_else(|| "Unknown error".to_string());
        tracing::debug!(status = response.status, action, "token endpoint rejected request");
        return Err(ApiError::Authentication(format!("{action} failed: {reason}")));
    }
    let payload: TokenResponse = serde_json::from_slice(&response.body).map_err(|err| {
        ApiError::InvalidResponse(format!("{action} returned an unreadable token: {err}"))
    })?;
    Ok(payload.into_token_info(previous_refresh, Utc::now()))
}
