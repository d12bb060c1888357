//! Retell-compatible REST client
//!
//! # API Reference
//!
//! - `PATCH {base}/update-agent` with `{ agent_id, prompt }`
//! - `POST {base}/create-web-call` with `{ agent_id, metadata }`
//!   → `{ access_token, call_id, agent_id }`
//!
//! Both requests authenticate with `Authorization: Bearer <api key>`.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::{ProviderError, ProviderResult, VoiceProvider, WebCall, WebCallRequest};

/// Default Retell API base URL
pub const DEFAULT_RETELL_BASE_URL: &str = "https://api.retellai.com/v2";

/// Provider error bodies are logged up to this many bytes
const MAX_LOGGED_BODY: usize = 512;

/// REST client for the voice provider
pub struct RetellClient {
    client: reqwest::Client,
    api_key: Zeroizing<String>,
    base_url: String,
    timeout: Duration,
}

impl RetellClient {
    /// Create a client for `base_url` (trailing slashes are ignored)
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            api_key: Zeroizing::new(api_key.into()),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Turn a non-success response into `ProviderError::Status`
    async fn check_status(response: reqwest::Response, operation: &str) -> ProviderResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_LOGGED_BODY {
            let mut cut = MAX_LOGGED_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }

        warn!(
            operation = %operation,
            status = %status,
            body = %body,
            "Voice provider returned non-success status"
        );

        Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl VoiceProvider for RetellClient {
    async fn update_agent_prompt(&self, agent_id: &str, prompt: &str) -> ProviderResult<()> {
        debug!(agent_id = %agent_id, prompt_len = prompt.len(), "Updating agent prompt");

        let response = self
            .client
            .patch(self.endpoint("update-agent"))
            .timeout(self.timeout)
            .bearer_auth(self.api_key.as_str())
            .json(&json!({
                "agent_id": agent_id,
                "prompt": prompt,
            }))
            .send()
            .await?;

        Self::check_status(response, "update-agent").await?;
        Ok(())
    }

    async fn create_web_call(&self, request: &WebCallRequest) -> ProviderResult<WebCall> {
        debug!(agent_id = %request.agent_id, "Creating web call");

        let response = self
            .client
            .post(self.endpoint("create-web-call"))
            .timeout(self.timeout)
            .bearer_auth(self.api_key.as_str())
            .json(request)
            .send()
            .await?;

        let response = Self::check_status(response, "create-web-call").await?;
        response
            .json::<WebCall>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "retell"
    }
}
