//! Gate API
//!
//! HTTP front end for the subscription gate.
//!
//! ## Endpoints
//!
//! - `POST /api/check-subscription` - Issue a session token to an active subscriber
//! - `POST /api/validate-token` - Verify a session token and re-check its subscriber
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use crate::config::{Config, ConfigError, SourceConfig};
pub use crate::state::AppState;

/// Build the HTTP router
pub fn build_router(state: AppState) -> Router {
    let request_timeout = state.request_timeout();

    let api = Router::new()
        .route("/check-subscription", post(handlers::check_subscription))
        .route("/validate-token", post(handlers::validate_token));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready));

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Browser extensions call the gate cross-origin
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .nest("/api", api)
        .layer(middleware)
        .merge(health_routes)
        .with_state(state)
}
