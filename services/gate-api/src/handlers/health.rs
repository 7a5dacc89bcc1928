//! Health check handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use std::time::Instant;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub checks: ReadyChecks,
}

#[derive(Debug, Serialize)]
pub struct ReadyChecks {
    pub entitlements: CheckResult,
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub status: &'static str,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
}

/// GET /health - Liveness probe (fast, no dependencies)
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "gate-api",
    })
}

/// GET /ready - Readiness probe (entitlement snapshot obtainable)
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let start = Instant::now();
    let snapshot = state.gate.store().snapshot().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, check) = match snapshot {
        Ok(snapshot) => (
            StatusCode::OK,
            CheckResult {
                status: "ok",
                latency_ms,
                records: Some(snapshot.len()),
            },
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                CheckResult {
                    status: "error",
                    latency_ms,
                    records: None,
                },
            )
        }
    };

    let body = ReadyResponse {
        status: if status.is_success() { "ready" } else { "not_ready" },
        service: "gate-api",
        checks: ReadyChecks {
            entitlements: check,
        },
    };

    (status, Json(body))
}
