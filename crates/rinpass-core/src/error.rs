//! Gate errors

use rinpass_types::{codes, RinError};
use thiserror::Error;

/// Failures of a gate operation
///
/// Denials are not errors; they are returned as
/// [`Decision::Denied`](rinpass_types::Decision::Denied).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Required configuration is missing (e.g. the signing secret)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Missing or malformed identifier or token
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Backing entitlement source unreachable, timed out, or returned a non-success status
    #[error("entitlement source unavailable: {0}")]
    SourceUnavailable(String),

    /// Backing entitlement source returned a document that is not a valid entitlement list
    #[error("malformed entitlement source: {0}")]
    MalformedSource(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::MalformedSource(_) => 502,
            Self::SourceUnavailable(_) => 503,
            Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => codes::CONFIGURATION_ERROR,
            Self::InvalidInput(_) => codes::INVALID_INPUT,
            Self::SourceUnavailable(_) => codes::SOURCE_UNAVAILABLE,
            Self::MalformedSource(_) => codes::MALFORMED_SOURCE,
            Self::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Whether a caller may reasonably retry the same request
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_))
    }
}

impl From<RinError> for GateError {
    fn from(err: RinError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Token verification failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Not three non-empty segments, or the payload cannot be decoded
    #[error("malformed token")]
    Malformed,

    /// Signature does not match header and payload
    #[error("invalid signature")]
    BadSignature,

    /// Token is past its expiry
    #[error("token expired")]
    Expired,
}

impl From<TokenError> for rinpass_types::DenialReason {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed => Self::MalformedToken,
            TokenError::BadSignature => Self::BadSignature,
            TokenError::Expired => Self::TokenExpired,
        }
    }
}
