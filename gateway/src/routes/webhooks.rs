use axum::{Router, routing::post};
use tower_http::trace::TraceLayer;

use crate::handlers::webhook;
use crate::state::AppState;
use std::sync::Arc;

/// Create the router for voice provider callbacks
pub fn create_webhook_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/webhook/llm", post(webhook::llm_webhook))
        .route("/api/webhook/call-events", post(webhook::call_events))
        .layer(TraceLayer::new_for_http())
}
