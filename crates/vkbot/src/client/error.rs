//! API call errors.

use thiserror::Error;

use super::transport::TransportError;

/// Errors returned by [`MethodCaller::call`](super::MethodCaller::call).
#[derive(Debug, Error)]
pub enum ApiError {
    /// Client constructed without an access token.
    #[error("access token not configured")]
    MissingToken,

    #[error("invalid api version: {0}")]
    InvalidVersion(String),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// The HTTP exchange itself failed.
    #[error("api request failed: {0}")]
    Transport(#[from] TransportError),

    /// The platform answered with an `error` envelope.
    #[error("api error [{code}]: {message}")]
    Api { code: i64, message: String },

    /// The body was JSON but had neither `response` nor `error`.
    #[error("invalid api response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Platform error code, if the failure came from an error envelope.
    pub fn code(&self) -> Option<i64> {
        match self {
            ApiError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}
