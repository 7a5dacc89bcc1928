//! Error types for the Gate API service.
//!
//! Every failure is answered in the same envelope as a denial:
//! `{"granted": false, "reason": .., "code": ..}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rinpass_core::GateError;
use rinpass_types::{codes, DenialReason, IssueResponse};

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("No session token provided")]
    MissingToken,

    #[error(transparent)]
    Gate(#[from] GateError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::Gate(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => codes::INVALID_INPUT,
            Self::MissingToken => codes::MISSING_TOKEN,
            Self::Gate(e) => e.error_code(),
        }
    }

    /// Text safe to show the caller
    fn public_message(&self) -> String {
        match self {
            Self::Gate(GateError::Configuration(_)) => "server misconfigured".to_string(),
            Self::Gate(GateError::Internal(_)) => "internal error".to_string(),
            Self::Gate(GateError::SourceUnavailable(_)) => {
                "entitlement source unavailable".to_string()
            }
            Self::Gate(GateError::MalformedSource(_)) => {
                "entitlement source returned an invalid document".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Gate request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Gate request rejected");
        }

        let body = IssueResponse::failure(self.error_code(), self.public_message());
        (status, Json(body)).into_response()
    }
}

/// HTTP status for a denial
///
/// Token problems mean the caller must authenticate again (401); entitlement
/// problems mean the caller is known but not allowed (403).
pub fn denial_status(reason: DenialReason) -> StatusCode {
    if reason.is_token_failure() {
        StatusCode::UNAUTHORIZED
    } else {
        StatusCode::FORBIDDEN
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
