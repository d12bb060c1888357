//! Web call creation
//!
//! A node flow is compiled into agent instructions and pushed to the agent
//! before the call is created. A branched flow is compiled into a prompt and
//! bound to the new call in the session registry, so that webhook turns can
//! be answered by the branch matcher. With no flow the default agent is used.

use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::flow::FlowPayload;
use crate::config::ResponseMode;
use crate::errors::AppResult;
use crate::flow::{CallSession, ConversationFlow, FlowDocument, FlowNode};
use crate::provider::{ProviderError, VoiceProvider, WebCall, WebCallRequest};
use crate::state::{API_VERSION, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebCallResponse {
    pub access_token: String,
    pub call_id: String,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Create a browser web call, optionally driven by a flow
pub async fn create_web_call(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FlowPayload>,
) -> AppResult<Json<CreateWebCallResponse>> {
    let document = payload.document()?;

    let agent_id = match state.config.provider_credentials() {
        Some((_, agent_id)) => agent_id.to_string(),
        None if !state.config.has_api_key() => return Err(missing_api_key().into()),
        None => {
            return Err(ProviderError::MissingCredentials(
                "RETELL_AGENT_ID is not configured".to_string(),
            )
            .into());
        }
    };
    let provider = state.provider.clone().ok_or_else(missing_api_key)?;

    let (call, instructions) = match document {
        Some((FlowDocument::Nodes(nodes), raw)) => {
            start_node_flow(&state, provider.as_ref(), &agent_id, &nodes, raw).await?
        }
        Some((FlowDocument::Branched(flow), raw)) => {
            start_branched_flow(&state, provider.as_ref(), &agent_id, flow, raw).await?
        }
        None => {
            let call = provider
                .create_web_call(&WebCallRequest {
                    agent_id: agent_id.clone(),
                    metadata: None,
                })
                .await?;
            info!(call_id = %call.call_id, agent_id = %agent_id, "Web call created with default agent");
            (call, None)
        }
    };

    Ok(Json(CreateWebCallResponse {
        access_token: call.access_token,
        call_id: call.call_id,
        version: API_VERSION,
        instructions,
    }))
}

fn missing_api_key() -> ProviderError {
    ProviderError::MissingCredentials("RETELL_API_KEY is not configured".to_string())
}

async fn start_node_flow(
    state: &AppState,
    provider: &dyn VoiceProvider,
    agent_id: &str,
    nodes: &[FlowNode],
    raw: &Value,
) -> AppResult<(WebCall, Option<String>)> {
    let report = state.compiler.compile_instructions_report(nodes);
    debug!(
        nodes = nodes.len(),
        ignored_welcome = report.ignored_welcome_nodes.len(),
        "Compiled node flow"
    );

    provider.update_agent_prompt(agent_id, &report.text).await?;

    let call = provider
        .create_web_call(&WebCallRequest {
            agent_id: agent_id.to_string(),
            metadata: Some(json!({
                "flow_data": raw.to_string(),
                "instructions": report.text,
            })),
        })
        .await?;

    info!(call_id = %call.call_id, agent_id = %agent_id, "Web call created with node flow");
    Ok((call, Some(report.text)))
}

async fn start_branched_flow(
    state: &AppState,
    provider: &dyn VoiceProvider,
    agent_id: &str,
    flow: ConversationFlow,
    raw: &Value,
) -> AppResult<(WebCall, Option<String>)> {
    for warning in flow.validate() {
        warn!(warning = %warning, "Conversation flow warning");
    }

    let prompt = state.compiler.compile_branched_prompt(&flow);
    let mode = state.config.response_mode;

    if mode == ResponseMode::Prompt {
        provider.update_agent_prompt(agent_id, &prompt).await?;
    }

    let call = provider
        .create_web_call(&WebCallRequest {
            agent_id: agent_id.to_string(),
            metadata: Some(json!({
                "conversation_flow": raw.to_string(),
                "response_mode": mode.as_str(),
            })),
        })
        .await?;

    let branches = flow.branches.len();
    if let Err(e) = state.sessions.put(CallSession::new(call.call_id.clone(), flow)).await {
        error!(call_id = %call.call_id, error = %e, "Failed to bind conversation flow to call");
        // Webhook replies depend on the session; prompt mode works without it
        if mode == ResponseMode::Webhook {
            return Err(e.into());
        }
    }

    info!(
        call_id = %call.call_id,
        agent_id = %agent_id,
        branches,
        response_mode = %mode,
        "Web call created with conversation flow"
    );
    Ok((call, Some(prompt)))
}
