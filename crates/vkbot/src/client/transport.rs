//! HTTP transport seam.
//!
//! Everything that touches the network goes through [`Transport`], so the
//! RPC caller and the long-poll loop can be driven by scripted fakes in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Errors produced while performing a single HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request did not complete within its time limit.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, TLS or protocol failure.
    #[error("http request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("unexpected http status {0}")]
    Status(u16),

    /// The body was not valid JSON.
    #[error("invalid json body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl TransportError {
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(timeout)
        } else {
            TransportError::Request(err)
        }
    }
}

/// Performs HTTP requests and decodes JSON bodies.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Plain GET; the long-poll fetch uses this.
    async fn get(&self, url: &Url, timeout: Duration) -> Result<Value, TransportError>;

    /// Form-encoded POST; API method calls use this.
    async fn post_form(
        &self,
        url: &Url,
        form: &[(String, String)],
        timeout: Duration,
    ) -> Result<Value, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url, timeout: Duration) -> Result<Value, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, timeout))?;

        decode(response, timeout).await
    }

    async fn post_form(
        &self,
        url: &Url,
        form: &[(String, String)],
        timeout: Duration,
    ) -> Result<Value, TransportError> {
        let response = self
            .client
            .post(url.clone())
            .timeout(timeout)
            .form(form)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, timeout))?;

        decode(response, timeout).await
    }
}

async fn decode(response: reqwest::Response, timeout: Duration) -> Result<Value, TransportError> {
    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status(status.as_u16()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| TransportError::from_reqwest(e, timeout))?;

    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_includes_duration() {
        let err = TransportError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "request timed out after 30s");
    }

    #[test]
    fn decode_error_converts() {
        let json_err = serde_json::from_str::<Value>("not json").unwrap_err();
        let err: TransportError = json_err.into();
        assert!(matches!(err, TransportError::Decode(_)));
        assert!(err.to_string().starts_with("invalid json body"));
    }
}
