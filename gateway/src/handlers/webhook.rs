//! Voice provider webhooks
//!
//! - `llm`: the provider asks what the agent should say next
//! - `call-events`: lifecycle notifications used to evict sessions

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::errors::AppResult;
use crate::flow::{CallSession, MatchOutcome, TurnContext, Utterance, resolve_turn};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmWebhookRequest {
    pub call_id: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Echoed back unchanged when present
    #[serde(default)]
    pub response_id: Option<u64>,
    #[serde(default)]
    pub message_history: Vec<Utterance>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmWebhookResponse {
    pub response: String,
    pub response_id: u64,
}

/// Answer one conversational turn from the call's bound flow
///
/// Never fails: a missing session or an unreachable store degrades to the
/// fallback greeting so the caller always hears something.
pub async fn llm_webhook(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LlmWebhookRequest>,
) -> Json<LlmWebhookResponse> {
    let turn = TurnContext::from_history(&request.message_history);

    let session = match state.sessions.get(&request.call_id).await {
        Ok(Some(session)) => Some(session),
        Ok(None) => {
            warn!(call_id = %request.call_id, "No active flow for call");
            None
        }
        Err(e) => {
            error!(call_id = %request.call_id, error = %e, "Session lookup failed");
            None
        }
    };

    let reply = resolve_turn(
        session.as_ref().map(|s| &*s.flow),
        &turn.latest_user_utterance,
        turn.is_first_turn,
    );

    debug!(
        call_id = %request.call_id,
        conversation_id = request.conversation_id.as_deref().unwrap_or(""),
        user_turns = turn.user_turns,
        outcome = ?reply.outcome,
        "Resolved webhook turn"
    );

    if let Some(session) = session {
        touch_session(&state, &session, turn.user_turns).await;
    }

    if let MatchOutcome::Clarification = reply.outcome {
        info!(call_id = %request.call_id, "No branch matched; asking caller to clarify");
    }

    let response_id = request
        .response_id
        .unwrap_or_else(|| u64::from(turn.user_turns));

    Json(LlmWebhookResponse {
        response: reply.text,
        response_id,
    })
}

/// Record the turn count and restart the session TTL, unless the call ended
async fn touch_session(state: &AppState, session: &CallSession, user_turns: u32) {
    match state.sessions.refresh(session.with_turn_count(user_turns)).await {
        Ok(true) => {}
        Ok(false) => {
            debug!(call_id = %session.call_id, "Session ended during turn; not refreshed");
        }
        Err(e) => {
            warn!(call_id = %session.call_id, error = %e, "Failed to refresh call session");
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CallEventRequest {
    pub event: String,
    pub call: CallEventCall,
}

#[derive(Debug, Deserialize)]
pub struct CallEventCall {
    pub call_id: String,
}

/// Evict sessions of finished calls
pub async fn call_events(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CallEventRequest>,
) -> AppResult<StatusCode> {
    match request.event.as_str() {
        "call_ended" | "call_analyzed" => {
            state.sessions.remove(&request.call.call_id).await?;
            info!(
                call_id = %request.call.call_id,
                event = %request.event,
                "Call session evicted"
            );
        }
        other => {
            debug!(call_id = %request.call.call_id, event = %other, "Ignoring call event");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}
