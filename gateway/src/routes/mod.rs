//! Route tables
//!
//! - `api`: browser-facing endpoints (agent config, call creation, flow preview)
//! - `webhooks`: callbacks from the voice provider

pub mod api;
pub mod webhooks;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

/// All routes with the public health check, before server-wide layers
pub fn create_app_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::api::health_check))
        .merge(webhooks::create_webhook_router())
        .merge(api::create_api_router())
}
