//! Long-poll error types.

use thiserror::Error;

use crate::client::{ApiError, TransportError};

/// Server acquisition failed.
///
/// This is the only long-poll error a caller ever sees; every other failure
/// is absorbed by the poll loop and reported as a [`Cycle`](super::Cycle).
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("long poll server request failed: {0}")]
    Api(#[from] ApiError),

    #[error("long poll server response is missing `{0}`")]
    MissingField(&'static str),

    #[error("long poll server response has invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Why a fetch cycle could not produce a usable response.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("malformed poll response: {0}")]
    Malformed(String),

    #[error("unknown poll failure code {0}")]
    UnknownFailure(i64),
}
