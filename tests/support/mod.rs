#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use euroleague::auth::{MemoryTokenStore, TokenInfo};
use euroleague::config::ClientConfig;
use euroleague::error::{ApiError, Result};
use euroleague::http::{Transport, TransportRequest, TransportResponse};
use euroleague::util::retry::RetryPolicy;

pub const TOKEN_PATH: &str = "/oauth2/token";

/// Retry delays short enough for tests against a real socket.
pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts)
        .with_base_delay(Duration::from_millis(5))
        .with_max_delay(Duration::from_millis(20))
}

pub fn config_for(base: &str) -> ClientConfig {
    ClientConfig::builder()
        .base_url(base.to_string())
        .auth_url(format!("{base}/oauth2/authorize"))
        .token_url(format!("{base}{TOKEN_PATH}"))
        .client_id("test-client".to_string())
        .timeout(Duration::from_secs(5))
        .retry(fast_policy(3))
        .build()
}

pub fn valid_token(access: &str) -> TokenInfo {
    TokenInfo::new(access, 3600).with_refresh_token("refresh-1")
}

pub fn expired_token(refresh: Option<&str>) -> TokenInfo {
    let token =
        TokenInfo::new("stale", 3600).with_obtained_at(Utc::now() - chrono::Duration::seconds(3700));
    match refresh {
        Some(refresh) => token.with_refresh_token(refresh),
        None => token,
    }
}

pub fn store_with(token: TokenInfo) -> Arc<MemoryTokenStore> {
    Arc::new(MemoryTokenStore::with_token(token))
}

pub fn token_body(access: &str, refresh: Option<&str>) -> Value {
    let mut body = json!({
        "access_token": access,
        "token_type": "Bearer",
        "expires_in": 3600,
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = json!(refresh);
    }
    body
}

/// In-memory [`Transport`] replaying a fixed script, then answering `200 {}`.
///
/// Each send can be delayed with tokio time, so tests run under a paused
/// clock without touching sockets.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<TransportResponse>>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<TransportResponse>>) -> Arc<Self> {
        Self::with_delay(script, Duration::ZERO)
    }

    pub fn with_delay(script: Vec<Result<TransportResponse>>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, _request: TransportRequest) -> Result<TransportResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.script
            .lock()
            .expect("script lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(TransportResponse::new(200, "{}")))
    }
}

/// Wraps a real transport and fails its first `failures` sends with a
/// connection error.
pub struct FlakyTransport<T> {
    inner: T,
    failures: usize,
    calls: AtomicUsize,
}

impl<T> FlakyTransport<T> {
    pub fn new(inner: T, failures: usize) -> Arc<Self> {
        Arc::new(Self {
            inner,
            failures,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<T: Transport> Transport for FlakyTransport<T> {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(ApiError::transport("connection reset by peer"));
        }
        self.inner.send(request).await
    }
}
