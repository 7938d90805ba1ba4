//! Error types for the ORCA API client.
//!
//! # Design
//! Only exchange-level failures live here. Status codes reported by the
//! service (`E10`, `E14`, `S40`, ...) travel inside a normally returned
//! `OrcaResult` and never become an `ApiError`.

use thiserror::Error;

/// Errors returned by client, result and lock-release operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The host transport failed. The original error is kept as the source.
    #[error("transport failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The service answered with a non-200 HTTP status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body is not valid JSON.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request envelope could not be encoded.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The response is not an object with exactly one key wrapping an object.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The service did not return the requested field for this exchange.
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// Configuration could not be loaded or failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A multi-step flow received a response it was not waiting for.
    #[error("invalid flow state: {0}")]
    InvalidState(&'static str),
}

impl ApiError {
    pub(crate) fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ApiError::Transport(Box::new(err))
    }
}
