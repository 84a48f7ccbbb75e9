use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Seconds subtracted from a token's lifetime when checking expiry.
pub const EXPIRY_SAFETY_MARGIN_SECS: i64 = 60;

const DEFAULT_TOKEN_TYPE: &str = "Bearer";
const DEFAULT_EXPIRES_IN: u64 = 3600;

/// OAuth2 credential record, as persisted by a [`TokenStore`](super::TokenStore).
///
/// # Example
/// ```
/// use euroleague::auth::TokenInfo;
///
/// let token = TokenInfo::new("access", 3600).with_refresh_token("refresh");
/// assert!(!token.is_expired());
/// assert_eq!(token.authorization_header(), "Bearer access");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds, counted from `obtained_at`.
    pub expires_in: u64,
    pub obtained_at: DateTime<Utc>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenInfo {
    pub fn new(access_token: impl Into<String>, expires_in: u64) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            expires_in,
            obtained_at: Utc::now(),
            refresh_token: None,
            scope: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_obtained_at(mut self, obtained_at: DateTime<Utc>) -> Self {
        self.obtained_at = obtained_at;
        self
    }

    /// Nominal expiry, without the safety margin.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.obtained_at + Duration::seconds(clamp_secs(self.expires_in))
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// `now >= obtained_at + expires_in - safety margin`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at() - Duration::seconds(EXPIRY_SAFETY_MARGIN_SECS)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .map(|value| !value.trim().is_empty())
            .unwrap_or(false)
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        let scheme = if self.token_type.eq_ignore_ascii_case("bearer") {
            DEFAULT_TOKEN_TYPE
        } else {
            self.token_type.as_str()
        };
        format!("{scheme} {}", self.access_token)
    }
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

fn clamp_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX / 1000)
}

/// Token endpoint success payload (RFC 6749 §5.1).
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    token_type: Option<String>,
    expires_in: Option<u64>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

impl TokenResponse {
    /// Build the stored record. A refresh token omitted by the provider
    /// falls back to `previous_refresh`; a returned one replaces it.
    pub(crate) fn into_token_info(
        self,
        previous_refresh: Option<String>,
        now: DateTime<Utc>,
    ) -> TokenInfo {
        TokenInfo {
            access_token: self.access_token,
            token_type: self.token_type.unwrap_or_else(default_token_type),
            expires_in: self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
            obtained_at: now,
            refresh_token: self.refresh_token.or(previous_refresh),
            scope: self.scope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_past_lifetime_is_expired() {
        let now = Utc::now();
        let token =
            TokenInfo::new("a", 3600).with_obtained_at(now - Duration::seconds(3700));
        assert!(token.is_expired_at(now));
    }

    #[test]
    fn fresh_token_is_not_expired() {
        let now = Utc::now();
        let token = TokenInfo::new("a", 3600).with_obtained_at(now - Duration::seconds(10));
        assert!(!token.is_expired_at(now));
    }

    #[test]
    fn safety_margin_expires_token_early() {
        let now = Utc::now();
        let token = TokenInfo::new("a", 3600).with_obtained_at(now - Duration::seconds(3550));
        assert!(token.is_expired_at(now));
    }

    #[test]
    fn persisted_layout_round_trips_through_json() {
        let token = TokenInfo::new("access", 1800)
            .with_refresh_token("refresh")
            .with_scope("euroleagueapi");
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["access_token"], "access");
        assert_eq!(json["token_type"], "Bearer");
        assert_eq!(json["expires_in"], 1800);
        assert!(json["obtained_at"].is_string());

        let parsed: TokenInfo = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn token_response_applies_defaults_and_keeps_previous_refresh() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"new"}"#).unwrap();
        let token = response.into_token_info(Some("old-refresh".into()), Utc::now());
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 3600);
        assert_eq!(token.refresh_token.as_deref(), Some("old-refresh"));
    }

    #[test]
    fn token_response_rotates_refresh_token() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"new","token_type":"bearer","expires_in":60,"refresh_token":"rotated"}"#,
        )
        .unwrap();
        let token = response.into_token_info(Some("old-refresh".into()), Utc::now());
        assert_eq!(token.refresh_token.as_deref(), Some("rotated"));
        assert_eq!(token.authorization_header(), "Bearer new");
    }

    #[test]
    fn blank_refresh_token_cannot_refresh() {
        assert!(!TokenInfo::new("a", 60).can_refresh());
        assert!(!TokenInfo::new("a", 60).with_refresh_token("  ").can_refresh());
        assert!(TokenInfo::new("a", 60).with_refresh_token("r").can_refresh());
    }
}
