//! Flow compilation preview

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::flow::{CompiledFlow, FlowDocument, FlowResult, parse_conversation_flow};
use crate::state::AppState;

/// Flow payload accepted by the call and preview endpoints
///
/// `conversationFlow` wins when both are present. `flowData` may hold either
/// schema; the shape decides.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPayload {
    #[serde(default)]
    pub flow_data: Option<Value>,
    #[serde(default)]
    pub conversation_flow: Option<Value>,
}

impl FlowPayload {
    /// Parse whichever flow was supplied, returning it with its raw JSON
    pub fn document(&self) -> FlowResult<Option<(FlowDocument, &Value)>> {
        if let Some(raw) = &self.conversation_flow {
            let flow = parse_conversation_flow(raw)?;
            return Ok(Some((FlowDocument::Branched(flow), raw)));
        }
        if let Some(raw) = &self.flow_data {
            return Ok(Some((FlowDocument::parse(raw)?, raw)));
        }
        Ok(None)
    }
}

/// Compile a flow without touching the voice provider
pub async fn compile_flow(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FlowPayload>,
) -> AppResult<Json<CompiledFlow>> {
    let (document, _) = payload.document()?.ok_or_else(|| {
        AppError::BadRequest("Either flowData or conversationFlow is required".to_string())
    })?;

    let compiled = state.compiler.compile_document(&document);
    debug!(
        format = ?compiled.format,
        warnings = compiled.warnings.len(),
        "Compiled flow preview"
    );

    Ok(Json(compiled))
}
