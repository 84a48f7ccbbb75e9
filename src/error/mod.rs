//! Error types for the Euroleague client.

use std::time::Duration;

use thiserror::Error;

/// Primary error type for all client operations.
///
/// Every variant maps onto an [`ErrorKind`]; retry decisions are made on
/// the kind, never on the message text.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("{resource} not found: {identifier}")]
    NotFound { resource: String, identifier: String },

    #[error("Rate limit exceeded{}", retry_after_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("Server error (status {status}): {message}")]
    Server {
        status: u16,
        message: String,
        request_id: Option<String>,
    },

    #[error("Client error (status {status}): {message}")]
    Client {
        status: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Transport error: {message}")]
    Transport { message: String, timed_out: bool },

    #[error("Request cancelled: {0}")]
    Cancelled(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Flat classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authentication,
    Authorization,
    NotFound,
    RateLimited,
    Server,
    Client,
    Transport,
    Cancelled,
    Configuration,
    InvalidResponse,
    Io,
    Serialization,
}

impl ErrorKind {
    /// Kinds the request executor may re-attempt.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::Server | Self::Transport)
    }
}

impl ApiError {
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
            request_id: None,
        }
    }

    pub fn client(status: u16, message: impl Into<String>) -> Self {
        Self::Client {
            status,
            message: message.into(),
            details: None,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Server { .. } => ErrorKind::Server,
            Self::Client { .. } => ErrorKind::Client,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::InvalidResponse(_) => ErrorKind::InvalidResponse,
            Self::Io(_) => ErrorKind::Io,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// HTTP status code carried by this error, if it came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Authentication(_) => None,
            Self::Authorization(_) => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::RateLimited { .. } => Some(429),
            Self::Server { status, .. } | Self::Client { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided delay before the next attempt, for rate-limit errors.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport {
            timed_out: error.is_timeout(),
            message: error.to_string(),
        }
    }
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(delay) => format!(". Retry after {} seconds", delay.as_secs()),
        None => String::new(),
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ApiError>;
