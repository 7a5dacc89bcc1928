//! Client errors
//!
//! Error types for gate client operations, with mapping from the gate's
//! response codes and HTTP status.

use rinpass_types::{codes, DenialReason};
use thiserror::Error;

/// Result alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors for gate operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The gate answered and refused the request.
    #[error("access denied: {0}")]
    Denied(DenialReason),

    /// The gate (or this client) is misconfigured. Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The gate's entitlement source is temporarily unavailable.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The request was rejected as malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The gate failed in a way that is not expected to clear on retry.
    #[error("gate error ({code}): {message}")]
    Gate {
        /// Machine-readable code from the response
        code: String,
        /// Human-readable reason from the response
        message: String,
    },

    /// Connection error - failed to reach the gate.
    #[error("connection error: {message}")]
    Connection {
        /// Error message
        message: String,
        /// Whether the error is retryable
        retryable: bool,
    },

    /// Request timeout.
    #[error("request timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Session persistence failed.
    #[error("session store error: {0}")]
    Store(String),

    /// Response body could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ClientError {
    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { retryable, .. } => *retryable,
            Self::Timeout(_) => true,
            Self::Unavailable(_) => true,
            Self::Denied(_) => false,
            Self::Configuration(_) => false,
            Self::InvalidInput(_) => false,
            Self::Gate { .. } => false,
            Self::Store(_) => false,
            Self::Serialization(_) => false,
        }
    }

    /// Returns true for configuration-class failures.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Denial reason if the gate refused the request.
    #[must_use]
    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            Self::Denied(reason) => Some(*reason),
            _ => None,
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>, retryable: bool) -> Self {
        Self::Connection {
            message: message.into(),
            retryable,
        }
    }

    /// Classify a non-granted gate response by its `code`, falling back to
    /// the HTTP status when the body carried none.
    pub fn from_response(status: u16, code: Option<&str>, reason: Option<&str>) -> Self {
        let message = reason.unwrap_or("no reason given").to_string();

        if let Some(denial) = code.and_then(DenialReason::from_code) {
            return Self::Denied(denial);
        }

        match code {
            Some(codes::CONFIGURATION_ERROR) => Self::Configuration(message),
            Some(codes::SOURCE_UNAVAILABLE) => Self::Unavailable(message),
            Some(codes::INVALID_INPUT | codes::MISSING_TOKEN) => Self::InvalidInput(message),
            Some(code) => Self::Gate {
                code: code.to_string(),
                message,
            },
            None => match status {
                400 => Self::InvalidInput(message),
                429 | 502..=504 => Self::Unavailable(message),
                _ => Self::Gate {
                    code: format!("HTTP_{status}"),
                    message,
                },
            },
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(std::time::Duration::ZERO)
        } else if err.is_decode() {
            Self::Serialization(err.to_string())
        } else {
            Self::Connection {
                message: err.to_string(),
                retryable: err.is_connect() || err.is_request(),
            }
        }
    }
}

impl From<crate::config::ConfigError> for ClientError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ClientError::Timeout(std::time::Duration::from_secs(1)).is_retryable());
        assert!(ClientError::Unavailable("source down".to_string()).is_retryable());
        assert!(ClientError::connection("refused", true).is_retryable());
    }

    #[test]
    fn test_non_retryable_errors() {
        assert!(!ClientError::Denied(DenialReason::NotFound).is_retryable());
        assert!(!ClientError::Configuration("no secret".to_string()).is_retryable());
        assert!(!ClientError::InvalidInput("rin".to_string()).is_retryable());
        assert!(!ClientError::connection("bad url", false).is_retryable());
    }

    #[test]
    fn test_from_response_denial_codes() {
        let err = ClientError::from_response(403, Some("SUBSCRIPTION_EXPIRED"), Some("expired"));
        assert_eq!(err.denial(), Some(DenialReason::Expired));

        let err = ClientError::from_response(403, Some("NOT_FOUND"), Some("not found"));
        assert_eq!(err.denial(), Some(DenialReason::NotFound));
    }

    #[test]
    fn test_from_response_failure_codes() {
        let err = ClientError::from_response(500, Some(codes::CONFIGURATION_ERROR), None);
        assert!(err.is_configuration());
        assert!(!err.is_retryable());

        let err = ClientError::from_response(503, Some(codes::SOURCE_UNAVAILABLE), None);
        assert!(matches!(err, ClientError::Unavailable(_)));
        assert!(err.is_retryable());

        let err = ClientError::from_response(502, Some(codes::MALFORMED_SOURCE), None);
        assert!(matches!(err, ClientError::Gate { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_response_without_code_uses_status() {
        assert!(matches!(
            ClientError::from_response(503, None, None),
            ClientError::Unavailable(_)
        ));
        assert!(matches!(
            ClientError::from_response(429, None, None),
            ClientError::Unavailable(_)
        ));
        assert!(matches!(
            ClientError::from_response(400, None, None),
            ClientError::InvalidInput(_)
        ));
        assert!(matches!(
            ClientError::from_response(418, None, None),
            ClientError::Gate { .. }
        ));
        assert!(!ClientError::from_response(500, None, None).is_retryable());
    }
}
