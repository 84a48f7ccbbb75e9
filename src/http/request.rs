use std::time::Duration;

use reqwest::Method;

use super::transport::TransportRequest;

const USER_AGENT: &str = concat!("euroleague-rust/", env!("CARGO_PKG_VERSION"));

/// One logical API call, relative to the client's base URL.
///
/// Requests require authentication unless marked [`public`](Self::public).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub requires_auth: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            requires_auth: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add the parameter only when `value` is present.
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn extend_query(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    pub(crate) fn to_transport(
        &self,
        base_url: &str,
        timeout: Duration,
        authorization: Option<&str>,
    ) -> TransportRequest {
        let mut request = TransportRequest::new(
            self.method.clone(),
            join_url(base_url, &self.path),
            timeout,
        )
        .header("Accept", "application/json")
        .header("User-Agent", USER_AGENT)
        .query(self.query.clone());
        if let Some(value) = authorization {
            request = request.header("Authorization", value);
        }
        request
    }
}

pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
