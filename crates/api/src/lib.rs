//! HTTP API layer for platebook.
//!
//! This crate provides the REST API and the real-time notification socket:
//!
//! - **Endpoints**: users, restaurants, dishes, posts, notifications
//! - **Extractors**: authentication, validated JSON bodies and query strings
//! - **Middleware**: bearer-token authentication
//! - **Streaming**: WebSocket gateway for live notifications
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod streaming;

use axum::{Json, Router, middleware::from_fn_with_state, routing::get};
use serde_json::{Value, json};

pub use endpoints::router;
pub use middleware::AppState;
pub use streaming::{NotificationGateway, ws_handler};

/// Liveness probe.
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// The complete application: API routes, `/ws`, `/health` and the
/// authentication layer, bound to `state`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(router())
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware))
        .with_state(state)
}
