//! Authenticated API method calls.
//!
//! [`Client`] posts `{base_url}{method}` with the access token and API
//! version appended and normalizes the platform's response envelope:
//!
//! - `{"response": ...}` → `Ok(response)`
//! - `{"error": {"error_code", "error_msg"}}` → [`ApiError::Api`]
//! - anything else → [`ApiError::InvalidResponse`]

mod error;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::error;
use url::Url;

use crate::config::ApiConfig;
use crate::validator;

pub use error::ApiError;
pub use transport::{HttpTransport, Transport, TransportError};

// ============================================================================
// Params
// ============================================================================

/// Ordered method parameters. Setting an existing key replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Booleans go over the wire as `1`/`0`.
    #[must_use]
    pub fn with_flag(self, key: impl Into<String>, value: bool) -> Self {
        self.with(key, u8::from(value))
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.0
    }
}

// ============================================================================
// MethodCaller
// ============================================================================

/// Performs one authenticated API method call.
#[async_trait]
pub trait MethodCaller: Send + Sync {
    async fn call(&self, method: &str, params: Params) -> Result<Value, ApiError>;
}

// ============================================================================
// Client
// ============================================================================

/// API client holding the access credential and transport.
///
/// The credential is fixed for the lifetime of the client; clone the `Arc`
/// to share one client between several long-poll sessions.
pub struct Client {
    transport: Arc<dyn Transport>,
    access_token: String,
    api_version: String,
    base_url: Url,
    request_timeout: Duration,
}

impl Client {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.vk.com/method/";
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Client with default settings over [`HttpTransport`].
    pub fn new(access_token: impl Into<String>) -> Result<Self, ApiError> {
        let config = ApiConfig {
            access_token: Some(access_token.into()),
            ..ApiConfig::default()
        };
        Self::from_config(&config, Arc::new(HttpTransport::new()))
    }

    pub fn from_config(config: &ApiConfig, transport: Arc<dyn Transport>) -> Result<Self, ApiError> {
        let access_token = config
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::MissingToken)?
            .to_string();

        validator::validate_api_version(&config.version)
            .map_err(|_| ApiError::InvalidVersion(config.version.clone()))?;

        // `Url::join` drops the last path segment unless the base ends in '/'.
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            transport,
            access_token,
            api_version: config.version.clone(),
            base_url: Url::parse(&base)?,
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
        })
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    /// Run several API calls in one request via the `execute` method.
    ///
    /// Each fragment is a call expression such as
    /// `API.users.get({"user_ids": 1})`; the result is the array of their
    /// return values in order.
    pub async fn execute(&self, calls: &[&str]) -> Result<Value, ApiError> {
        let code = format!("return [{}];", calls.join(","));
        self.call("execute", Params::new().with("code", code)).await
    }
}

#[async_trait]
impl MethodCaller for Client {
    async fn call(&self, method: &str, params: Params) -> Result<Value, ApiError> {
        let url = self.base_url.join(method)?;

        let mut params = params;
        params.set("access_token", &self.access_token);
        params.set("v", &self.api_version);

        let body = self
            .transport
            .post_form(&url, &params.into_pairs(), self.request_timeout)
            .await
            .map_err(|e| {
                error!(method, error = %e, "API request failed");
                ApiError::from(e)
            })?;

        unwrap_envelope(method, body)
    }
}

fn unwrap_envelope(method: &str, body: Value) -> Result<Value, ApiError> {
    let mut body = match body {
        Value::Object(map) => map,
        other => {
            return Err(ApiError::InvalidResponse(format!(
                "expected a JSON object, got {other}"
            )));
        }
    };

    if let Some(err) = body.remove("error") {
        let code = err.get("error_code").and_then(Value::as_i64).unwrap_or(0);
        let message = err
            .get("error_msg")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();
        error!(method, code, message = %message, "API error");
        return Err(ApiError::Api { code, message });
    }

    body.remove("response")
        .ok_or_else(|| ApiError::InvalidResponse("missing `response` field".to_string()))
}
