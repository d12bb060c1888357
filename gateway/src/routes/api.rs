use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, calls, flow};
use crate::state::AppState;
use std::sync::Arc;

/// Create the browser-facing API router
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/agent-config", get(api::agent_config))
        .route("/api/create-web-call", post(calls::create_web_call))
        // Offline preview, never calls the provider
        .route("/api/flow/compile", post(flow::compile_flow))
        .layer(TraceLayer::new_for_http())
}
