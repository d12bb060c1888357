use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use std::sync::Arc;

use crate::state::{API_VERSION, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub api_key_configured: bool,
}

/// Liveness probe
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "OK",
        message: "Flowcall gateway is running",
        api_key_configured: state.config.has_api_key(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfigResponse {
    pub agent_id: Option<String>,
    pub has_api_key: bool,
    pub version: &'static str,
}

/// Report which agent calls will be placed against. Never exposes the key.
pub async fn agent_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(AgentConfigResponse {
        agent_id: state.config.provider_agent_id.clone(),
        has_api_key: state.config.has_api_key(),
        version: API_VERSION,
    })
}
