//! HTTP transport seam: the only place that touches the network.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Method;

use crate::error::Result;

/// A fully resolved HTTP request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    /// `application/x-www-form-urlencoded` body, used by the token endpoint.
    pub form: Option<Vec<(String, String)>>,
    pub timeout: Duration,
}

impl TransportRequest {
    pub fn new(method: Method, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            form: None,
            timeout,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query = pairs;
        self
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.form = Some(pairs);
        self
    }
}

/// Raw response: status, lower-cased headers, body bytes.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Non-blocking transport. Failures below HTTP become `ApiError::Transport`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Blocking transport with the same contract as [`Transport`].
pub trait BlockingTransport: Send + Sync {
    fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// [`Transport`] over a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .timeout(request.timeout)
            .query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.bytes().await?.to_vec();
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

/// [`BlockingTransport`] over a pooled `reqwest::blocking::Client`.
///
/// Must be created and dropped outside of an async runtime.
#[derive(Debug, Clone)]
pub struct BlockingReqwestTransport {
    client: reqwest::blocking::Client,
}

impl BlockingReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()?;
        Ok(Self { client })
    }
}

impl BlockingTransport for BlockingReqwestTransport {
    fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .timeout(request.timeout)
            .query(&request.query);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.bytes()?.to_vec();
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect()
}
