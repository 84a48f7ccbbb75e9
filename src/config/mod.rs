//! Client configuration (layered: code > env > defaults).

use std::path::PathBuf;
use std::time::Duration;

use bon::Builder;

use crate::error::{ApiError, Result};
use crate::util::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api-live.euroleague.net";
pub const DEFAULT_AUTH_URL: &str = "https://auth.euroleague.net/oauth2/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://auth.euroleague.net/oauth2/token";
pub const DEFAULT_SCOPE: &str = "euroleagueapi";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/callback";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by the async and blocking clients.
///
/// # Example
/// ```
/// use euroleague::config::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .client_id("my-client".to_string())
///     .build();
/// assert_eq!(config.base_url, "https://api-live.euroleague.net");
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    #[builder(default = DEFAULT_BASE_URL.to_string())]
    pub base_url: String,
    #[builder(default = DEFAULT_AUTH_URL.to_string())]
    pub auth_url: String,
    #[builder(default = DEFAULT_TOKEN_URL.to_string())]
    pub token_url: String,
    #[builder(default)]
    pub client_id: String,
    #[builder(default = DEFAULT_REDIRECT_URI.to_string())]
    pub redirect_uri: String,
    #[builder(default = DEFAULT_SCOPE.to_string())]
    pub scope: String,
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
    #[builder(default)]
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientConfig {
    /// Load from environment variables (`EUROLEAGUE_*`), reading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        let string_mappings: [(&str, &mut String); 6] = [
            ("EUROLEAGUE_CLIENT_ID", &mut config.client_id),
            ("EUROLEAGUE_BASE_URL", &mut config.base_url),
            ("EUROLEAGUE_AUTH_URL", &mut config.auth_url),
            ("EUROLEAGUE_TOKEN_URL", &mut config.token_url),
            ("EUROLEAGUE_REDIRECT_URI", &mut config.redirect_uri),
            ("EUROLEAGUE_SCOPE", &mut config.scope),
        ];
        for (key, slot) in string_mappings {
            if let Some(value) = lookup(key) {
                *slot = value;
            }
        }

        if let Some(raw) = lookup("EUROLEAGUE_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ApiError::Configuration(format!("EUROLEAGUE_TIMEOUT_SECS is not a number: {raw}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup("EUROLEAGUE_MAX_ATTEMPTS") {
            config.retry.max_attempts = raw.trim().parse().map_err(|_| {
                ApiError::Configuration(format!("EUROLEAGUE_MAX_ATTEMPTS is not a number: {raw}"))
            })?;
        }

        config.validate()
    }

    /// Normalize and check the config. Returns the normalized copy.
    pub fn validate(mut self) -> Result<Self> {
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        check_secure_url("base_url", &self.base_url)?;
        check_secure_url("token_url", &self.token_url)?;
        if self.retry.max_attempts == 0 {
            return Err(ApiError::Configuration(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ApiError::Configuration(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }

    /// Default token file path (`~/.euroleague/token.json`).
    pub fn default_token_path() -> PathBuf {
        directories::UserDirs::new()
            .map(|dirs| dirs.home_dir().join(".euroleague"))
            .unwrap_or_else(|| PathBuf::from(".euroleague"))
            .join("token.json")
    }
}

/// HTTPS is required except for loopback hosts, which local mock servers use.
fn check_secure_url(field: &str, raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|err| ApiError::Configuration(format!("{field} is not a valid URL ({err}): {raw}")))?;
    match parsed.scheme() {
        "https" => Ok(()),
        "http" if is_loopback(&parsed) => Ok(()),
        _ => Err(ApiError::Configuration(format!(
            "{field} must use HTTPS: {raw}"
        ))),
    }
}

fn is_loopback(parsed: &url::Url) -> bool {
    match parsed.host() {
        Some(url::Host::Domain(domain)) => domain == "localhost",
        Some(url::Host::Ipv4(addr)) => addr.is_loopback(),
        Some(url::Host::Ipv6(addr)) => addr.is_loopback(),
        None => false,
    }
}
