//! Voice provider interface
//!
//! The gateway needs two things from the conversational voice provider:
//! pushing a prompt onto an agent and creating a browser web call. Handlers
//! depend on [`VoiceProvider`] only, so tests can point the REST client at a
//! mock server or substitute their own implementation.

pub mod retell;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use retell::{DEFAULT_RETELL_BASE_URL, RetellClient};

/// Errors talking to the voice provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// API key or agent id not configured
    #[error("Voice provider credentials not configured: {0}")]
    MissingCredentials(String),

    /// Request could not be sent or timed out
    #[error("Voice provider request failed: {0}")]
    Http(String),

    /// Provider answered with a non-success status
    #[error("Voice provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Provider answered 2xx with a body we could not read
    #[error("Invalid voice provider response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Http(e.to_string())
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Web call creation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebCallRequest {
    pub agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Web call created by the provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebCall {
    /// Token the browser SDK uses to join the call
    pub access_token: String,
    pub call_id: String,
    #[serde(default)]
    pub agent_id: Option<String>,
}

/// Operations the gateway performs against the voice provider
#[async_trait]
pub trait VoiceProvider: Send + Sync {
    /// Replace the agent's prompt
    async fn update_agent_prompt(&self, agent_id: &str, prompt: &str) -> ProviderResult<()>;

    /// Create a web call for the browser
    async fn create_web_call(&self, request: &WebCallRequest) -> ProviderResult<WebCall>;

    /// Provider name for logs
    fn name(&self) -> &'static str;
}
