//! Subscription check and token issuance

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use rinpass_core::GateError;
use rinpass_types::{Decision, IssueRequest, IssueResponse};

use crate::error::{denial_status, ApiError, ApiResult};
use crate::state::AppState;

/// POST /api/check-subscription - Issue a session token to an active subscriber
pub async fn check_subscription(
    State(state): State<AppState>,
    payload: Result<Json<IssueRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<IssueResponse>)> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let rin = request.rin().map_err(GateError::from)?;

    tracing::info!(rin = %rin, "[check-subscription] request");

    let response = match state.gate.check_and_issue(&rin).await? {
        Decision::Granted(issued) => (StatusCode::OK, Json(IssueResponse::granted(issued.token))),
        Decision::Denied(reason) => (denial_status(reason), Json(IssueResponse::denied(reason))),
    };

    Ok(response)
}
