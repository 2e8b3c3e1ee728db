//! Resilient API client.
//!
//! Wraps one `reqwest::Client` with:
//! - authentication (bearer token or a custom header)
//! - static extra headers
//! - an idempotency header carrying a caller-supplied key
//! - a [`RateLimiter`] consulted before every call
//! - [`RetryPolicy`]-driven retries of transient failures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hevyload::client::{AuthMode, ClientConfig, ResilientClient};
//!
//! let config = ClientConfig::new("https://api.hevyapp.com")
//!     .with_auth(AuthMode::Header { name: "api-key".into() }, Some(token))
//!     .with_idempotency_header("Idempotency-Key");
//! let mut client = ResilientClient::new(config)?;
//! let key = ResilientClient::new_idempotency_key();
//! let body = client.send(&Method::POST, "/v1/exercise_templates", &payload, Some(&key)).await?;
//! ```

pub mod rate_limit;
pub mod retry;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{ClientError, ConfigError, ConfigResult};
use crate::models::Payload;

pub use rate_limit::RateLimiter;
pub use retry::RetryPolicy;

/// Statuses worth retrying.
pub const TRANSIENT_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Default requests-per-minute ceiling.
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 60;

// =============================================================================
// Configuration
// =============================================================================

/// How the token is presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `<name>: <token>`
    Header { name: String },
}

/// Everything the client needs; fixed for the client's lifetime.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub auth: AuthMode,
    /// Without a token no auth header is sent.
    pub token: Option<String>,
    pub custom_headers: BTreeMap<String, String>,
    pub rate_limit_per_minute: u32,
    pub timeout: Duration,
    pub idempotency_header: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth: AuthMode::Bearer,
            token: None,
            custom_headers: BTreeMap::new(),
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            idempotency_header: None,
        }
    }

    pub fn with_auth(mut self, auth: AuthMode, token: Option<String>) -> Self {
        self.auth = auth;
        self.token = token;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_rate_limit(mut self, per_minute: u32) -> Self {
        self.rate_limit_per_minute = per_minute;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_idempotency_header(mut self, name: impl Into<String>) -> Self {
        self.idempotency_header = Some(name.into());
        self
    }

    /// Auth header followed by the custom headers; a custom header with the
    /// same name replaces the auth header.
    pub fn base_headers(&self) -> ConfigResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            match &self.auth {
                AuthMode::Bearer => {
                    let value = header_value("auth.token", &format!("Bearer {}", token))?;
                    headers.insert(AUTHORIZATION, value);
                }
                AuthMode::Header { name } => {
                    headers.insert(
                        header_name("auth.header_name", name)?,
                        header_value("auth.header_value", token)?,
                    );
                }
            }
        }

        for (name, value) in &self.custom_headers {
            let field = format!("custom_headers.{}", name);
            headers.insert(header_name(&field, name)?, header_value(&field, value)?);
        }

        Ok(headers)
    }
}

fn header_name(field: &str, name: &str) -> ConfigResult<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| ConfigError::invalid(field, format!("invalid header name '{}': {}", name, e)))
}

fn header_value(field: &str, value: &str) -> ConfigResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ConfigError::invalid(field, format!("invalid header value: {}", e)))
}

// =============================================================================
// Client
// =============================================================================

/// HTTP client with rate limiting, idempotency keys and retries.
///
/// Calls take `&mut self`: the rate limiter state is owned here and a run
/// submits one row at a time.
pub struct ResilientClient {
    http: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
    idempotency_header: Option<HeaderName>,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl ResilientClient {
    /// Build the client, rejecting bad URLs and header names up front.
    pub fn new(config: ClientConfig) -> ConfigResult<Self> {
        if config.base_url.is_empty() {
            return Err(ConfigError::invalid("api.base_url", "must not be empty"));
        }
        reqwest::Url::parse(&config.base_url)
            .map_err(|e| ConfigError::invalid("api.base_url", e.to_string()))?;

        let headers = config.base_headers()?;
        let idempotency_header = config
            .idempotency_header
            .as_deref()
            .map(|name| header_name("api.idempotency.header_name", name))
            .transpose()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::invalid("api", e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url,
            headers,
            idempotency_header,
            limiter: RateLimiter::per_minute(config.rate_limit_per_minute),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A fresh key for one row. Reuse it for every attempt of that row.
    pub fn new_idempotency_key() -> String {
        Uuid::new_v4().to_string()
    }

    /// Auth and custom headers sent with every call.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Headers for one call.
    ///
    /// # Errors
    /// [`ClientError::InvalidRequest`] when the key is not a valid header
    /// value. The key is never dropped.
    pub fn request_headers(
        &self,
        idempotency_key: Option<&str>,
    ) -> Result<HeaderMap, ClientError> {
        let mut headers = self.headers.clone();
        if let (Some(name), Some(key)) = (&self.idempotency_header, idempotency_key) {
            let value = HeaderValue::from_str(key).map_err(|e| {
                ClientError::InvalidRequest(format!("invalid idempotency key '{}': {}", key, e))
            })?;
            headers.insert(name.clone(), value);
        }
        Ok(headers)
    }

    /// One rate-limited attempt, no retries.
    ///
    /// # Errors
    /// [`ClientError::Transient`] for 429/500/502/503/504,
    /// [`ClientError::Fatal`] for other non-2xx statuses,
    /// [`ClientError::Network`] when no response arrives or a 2xx body
    /// cannot be read, [`ClientError::InvalidRequest`] for an idempotency
    /// key that cannot be sent as a header.
    pub async fn submit(
        &mut self,
        method: &Method,
        path: &str,
        payload: &Payload,
        idempotency_key: Option<&str>,
    ) -> Result<Value, ClientError> {
        let headers = self.request_headers(idempotency_key)?;
        self.limiter.wait_turn().await;

        let url = format!("{}{}", self.base_url, path);
        log::debug!("{} {}", method, url);

        let response = self
            .http
            .request(method.clone(), &url)
            .headers(headers)
            .json(payload)
            .send()
            .await?;

        // the status decides the error kind; a failed body read on a
        // non-2xx response only loses the body
        let status = response.status();
        let body = if status.is_success() {
            response.text().await?
        } else {
            response.text().await.unwrap_or_default()
        };
        classify(status, body)
    }

    /// [`submit`](Self::submit) under the retry policy.
    ///
    /// Transient failures are retried with backoff; the last one is
    /// returned unchanged once attempts run out. Any other error returns
    /// immediately. The same `idempotency_key` goes out on every attempt.
    pub async fn send(
        &mut self,
        method: &Method,
        path: &str,
        payload: &Payload,
        idempotency_key: Option<&str>,
    ) -> Result<Value, ClientError> {
        let attempts = self.retry.attempts();
        let mut attempt = 1;
        loop {
            match self.submit(method, path, payload, idempotency_key).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_transient() && attempt < attempts => {
                    let delay = self.retry.delay_after(attempt);
                    log::warn!(
                        "attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        attempts,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Map a status and body to the call's result.
fn classify(status: StatusCode, body: String) -> Result<Value, ClientError> {
    let code = status.as_u16();
    if TRANSIENT_STATUSES.contains(&code) {
        return Err(ClientError::Transient { status: code, body });
    }
    if !status.is_success() {
        return Err(ClientError::Fatal { status: code, body });
    }
    Ok(serde_json::from_str(&body).unwrap_or_else(|_| json!({ "raw": body })))
}
