//! Orchestrator HTTP client
//!
//! Thin blocking client for the orchestrator API, authenticated with the
//! resolved [`AuthContext`]. There is no retry: a send waits at most one
//! request timeout.
//!
//! The span emitter talks to the orchestrator through the [`SpanTransport`]
//! trait so the network can be swapped out in tests and embedders.

use bv_span::SpanBatch;
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde::Serialize;
use std::time::Duration;
use zeroize::Zeroizing;

use crate::auth::{require_auth, AuthContext};
use crate::env::{ClientConfig, RuntimeEnv};
use crate::error::AuthError;

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Client configuration error: {0}")]
    Config(String),
}

/// Delivery channel for span batches
#[cfg_attr(test, mockall::automock)]
pub trait SpanTransport: Send + Sync {
    fn send_spans(&self, batch: &SpanBatch) -> Result<(), ClientError>;
}

/// Authenticated client for one orchestrator
pub struct OrchestratorClient {
    http: Client,
    api_url: String,
    bearer: Zeroizing<String>,
}

impl std::fmt::Debug for OrchestratorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl OrchestratorClient {
    /// Create a client for an already resolved context
    pub fn new(ctx: &AuthContext, config: &ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            http,
            api_url: ctx.api_url().to_string(),
            bearer: ctx.bearer(),
        })
    }

    /// Resolve credentials for the snapshot and create a client
    pub fn connect(env: &RuntimeEnv, config: &ClientConfig) -> Result<Self, ClientError> {
        let ctx = require_auth(env)?;
        Self::new(&ctx, config)
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.api_url, path)
        } else {
            format!("{}/{}", self.api_url, path)
        }
    }

    /// POST a JSON body, returning the decoded response body if there is one
    pub fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Option<serde_json::Value>, ClientError> {
        let mut auth = HeaderValue::from_str(&self.bearer)
            .map_err(|e| ClientError::Config(format!("invalid access token: {}", e)))?;
        auth.set_sensitive(true);

        let payload = serde_json::to_vec(body)?;
        let response = self
            .http
            .post(self.url(path))
            .header(AUTHORIZATION, auth)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::Server {
                status: status.as_u16(),
                message: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }
}

impl SpanTransport for OrchestratorClient {
    fn send_spans(&self, batch: &SpanBatch) -> Result<(), ClientError> {
        self.post_json(&batch.endpoint_path(), batch).map(|_| ())
    }
}

/// Default transport: resolves credentials and connects on every send
///
/// Nothing is cached between sends, so a credential refreshed by
/// `bv auth login` mid-run is picked up by the next span.
#[derive(Debug, Clone)]
pub struct OrchestratorTransport {
    env: RuntimeEnv,
    config: ClientConfig,
}

impl OrchestratorTransport {
    pub fn new(env: RuntimeEnv, config: ClientConfig) -> Self {
        Self { env, config }
    }

    pub fn from_env() -> Self {
        Self::new(RuntimeEnv::from_env(), ClientConfig::from_env())
    }
}

impl SpanTransport for OrchestratorTransport {
    fn send_spans(&self, batch: &SpanBatch) -> Result<(), ClientError> {
        OrchestratorClient::connect(&self.env, &self.config)?.send_spans(batch)
    }
}
