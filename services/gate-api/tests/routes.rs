//! Router tests against a file-backed entitlement source

use std::io::Write;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration as ChronoDuration, Utc};
use gate_api::{build_router, AppState, Config};
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::ServiceExt;

const SECRET: &str = "gate-api-route-test-secret-0123456789";

struct TestApp {
    router: Router,
    _document: NamedTempFile,
}

fn write_document(subscriptions: Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json!({ "subscriptions": subscriptions }).to_string().as_bytes())
        .unwrap();
    file
}

fn app_with(subscriptions: Value) -> TestApp {
    let document = write_document(subscriptions);
    let path = document.path().to_string_lossy().to_string();

    let config = Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(SECRET.to_string()),
        "ENTITLEMENT_SOURCE" => Some("file".to_string()),
        "ENTITLEMENTS_FILE" => Some(path.clone()),
        _ => None,
    })
    .unwrap();

    let gate = config.build_gate().unwrap();
    TestApp {
        router: build_router(AppState::new(gate, config)),
        _document: document,
    }
}

fn default_app() -> TestApp {
    app_with(json!([
        {"rin": "A1", "expiry": (Utc::now() + ChronoDuration::days(30)).to_rfc3339()},
        {"rin": 42, "expiry": (Utc::now() + ChronoDuration::days(30)).timestamp()},
        {"rin": "OLD", "expiry": "2020-01-01"}
    ]))
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn validate_bearer(token: &str) -> Request<Body> {
    Request::post("/api/validate-token")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn issue(app: &TestApp, rin: Value) -> String {
    let (status, body) = send(app, post_json("/api/check-subscription", json!({ "rin": rin }))).await;
    assert_eq!(status, StatusCode::OK, "issuance failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_always_up() {
    let app = default_app();
    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn ready_reports_snapshot_size() {
    let app = default_app();
    let (status, body) = send(&app, Request::get("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["entitlements"]["records"], 3);
}

#[tokio::test]
async fn issue_then_validate() {
    let app = default_app();
    let token = issue(&app, json!("A1")).await;
    assert_eq!(token.split('.').count(), 3);

    let (status, body) = send(&app, validate_bearer(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["granted"], true);
    assert_eq!(body["record"]["rin"], "A1");
}

#[tokio::test]
async fn numeric_identifier_matches() {
    let app = default_app();
    let token = issue(&app, json!(42)).await;

    let (status, body) = send(
        &app,
        post_json("/api/validate-token", json!({ "token": token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record"]["rin"], "42");
}

#[tokio::test]
async fn identifier_alias_is_accepted() {
    let app = default_app();
    let (status, body) = send(
        &app,
        post_json("/api/check-subscription", json!({"identifier": " A1 "})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["granted"], true);
}

#[tokio::test]
async fn unknown_and_expired_subscribers_are_forbidden() {
    let app = default_app();

    let (status, body) = send(&app, post_json("/api/check-subscription", json!({"rin": "Z9"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"granted": false, "reason": "not found", "code": "NOT_FOUND"}));

    let (status, body) = send(&app, post_json("/api/check-subscription", json!({"rin": "OLD"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "SUBSCRIPTION_EXPIRED");
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn missing_identifier_is_bad_request() {
    let app = default_app();

    let (status, body) = send(&app, post_json("/api/check-subscription", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_INPUT");

    let (status, _) = send(&app, post_json("/api/check-subscription", json!({"rin": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::post("/api/check-subscription")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["granted"], false);
}

#[tokio::test]
async fn token_denials_are_unauthorized() {
    let app = default_app();

    let (status, body) = send(&app, validate_bearer("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "MALFORMED_TOKEN");

    let token = issue(&app, json!("A1")).await;
    let mut forged = token.clone();
    forged.pop();
    forged.push(if token.ends_with('A') { 'B' } else { 'A' });

    let (status, body) = send(&app, validate_bearer(&forged)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "BAD_SIGNATURE");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = default_app();
    let request = Request::post("/api/validate-token").body(Body::empty()).unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "MISSING_TOKEN");
}

#[tokio::test]
async fn broken_document_is_bad_gateway() {
    let app = app_with(json!([{"rin": "A1"}]));

    let (status, body) = send(&app, post_json("/api/check-subscription", json!({"rin": "A1"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "MALFORMED_SOURCE");

    let (status, _) = send(&app, Request::get("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn missing_document_is_service_unavailable() {
    let document = write_document(json!([]));
    let path = document.path().to_path_buf();
    drop(document);

    let config = Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(SECRET.to_string()),
        "ENTITLEMENT_SOURCE" => Some("file".to_string()),
        "ENTITLEMENTS_FILE" => Some(path.to_string_lossy().to_string()),
        _ => None,
    })
    .unwrap();
    let router = build_router(AppState::new(config.build_gate().unwrap(), config));

    let response = router
        .oneshot(post_json("/api/check-subscription", json!({"rin": "A1"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let app = default_app();
    let request = Request::options("/api/check-subscription")
        .header(header::ORIGIN, "chrome-extension://abcdef")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}
