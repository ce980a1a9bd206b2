//! HTTP router and handlers

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use ops_console_core::NavigationGate;
use serde::Deserialize;
use serde_json::json;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::debug;

use super::forward::{error_response, forward, matches_prefix};
use crate::session::SessionStore;

/// Shared application state
pub struct AppState {
    /// Upstream HTTP client (no redirects, no transparent decompression)
    pub client: reqwest::Client,
    /// Backend origin without trailing slash
    pub target: String,
    /// Forwarded path prefix
    pub prefix: String,
    /// Rewrite `Host` to the target authority
    pub change_origin: bool,
    /// Largest request body buffered for forwarding
    pub max_body_size: usize,
    /// Navigation gate over the console's session store
    pub gate: NavigationGate<Arc<dyn SessionStore>>,
}

/// Create the router
pub fn create_router(state: Arc<AppState>, max_concurrent_requests: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/__gate", get(gate_handler))
        .fallback(proxy_handler)
        .layer(ConcurrencyLimitLayer::new(max_concurrent_requests.max(1)))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Deserialize)]
struct GateQuery {
    to: String,
    from: Option<String>,
}

/// GET /__gate?to=..&from=.. - evaluate the navigation gate
async fn gate_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GateQuery>,
) -> impl IntoResponse {
    let evaluation = state.gate.evaluate(&query.to, query.from.as_deref());
    debug!(to = %query.to, decision = ?evaluation.decision, "Gate evaluated");

    Json(json!({
        "to": evaluation.request.to,
        "from": evaluation.request.from,
        "phase": evaluation.phase,
        "decision": evaluation.decision,
    }))
}

/// Everything else: forward under the prefix, 404 otherwise
async fn proxy_handler(State(state): State<Arc<AppState>>, request: Request<Body>) -> Response {
    let path = request.uri().path().to_string();
    if !matches_prefix(&state.prefix, &path) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Not Found",
                "path": path,
            })),
        )
            .into_response();
    }

    match forward(&state, request).await {
        Ok(response) => response,
        Err(e) => error_response(&state.target, &e),
    }
}
