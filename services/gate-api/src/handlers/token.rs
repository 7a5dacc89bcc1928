//! Session token validation

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use rinpass_types::{Decision, ValidateRequest, ValidateResponse};

use crate::error::{denial_status, ApiError, ApiResult};
use crate::state::AppState;

/// POST /api/validate-token - Verify a token and re-check its subscriber
///
/// The token is read from `Authorization: Bearer <token>`, or from a JSON
/// body `{"token": ..}` when no bearer header is sent.
pub async fn validate_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ValidateResponse>)> {
    let token = extract_token(&headers, &body)?;

    tracing::info!("[validate-token] request");

    let response = match state.gate.validate(&token).await? {
        Decision::Granted(record) => {
            tracing::debug!(rin = %record.rin, "[validate-token] granted");
            (StatusCode::OK, Json(ValidateResponse::granted(record)))
        }
        Decision::Denied(reason) => {
            (denial_status(reason), Json(ValidateResponse::denied(reason)))
        }
    };

    Ok(response)
}

fn extract_token(headers: &HeaderMap, body: &[u8]) -> Result<String, ApiError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| ApiError::BadRequest("invalid Authorization header encoding".into()))?;

        if let Some(token) = value.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::MissingToken);
    }

    let request: ValidateRequest = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))?;

    request
        .token
        .filter(|token| !token.trim().is_empty())
        .ok_or(ApiError::MissingToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_header_wins_over_body() {
        let token = extract_token(&bearer("Bearer from-header"), br#"{"token":"from-body"}"#);
        assert_eq!(token.unwrap(), "from-header");
    }

    #[test]
    fn test_body_token() {
        let token = extract_token(&HeaderMap::new(), br#"{"token":"from-body"}"#);
        assert_eq!(token.unwrap(), "from-body");
    }

    #[test]
    fn test_non_bearer_scheme_falls_back_to_body() {
        let token = extract_token(&bearer("Basic Zm9vOmJhcg=="), br#"{"token":"t"}"#);
        assert_eq!(token.unwrap(), "t");
    }

    #[test]
    fn test_missing_token() {
        assert!(matches!(
            extract_token(&HeaderMap::new(), b""),
            Err(ApiError::MissingToken)
        ));
        assert!(matches!(
            extract_token(&HeaderMap::new(), br#"{"token":"  "}"#),
            Err(ApiError::MissingToken)
        ));
        assert!(matches!(
            extract_token(&HeaderMap::new(), b"{}"),
            Err(ApiError::MissingToken)
        ));
    }

    #[test]
    fn test_garbage_body() {
        assert!(matches!(
            extract_token(&HeaderMap::new(), b"token=abc"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
