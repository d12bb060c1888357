//! Test Fixtures Module
//!
//! Shared helpers for gateway integration tests:
//! - Configuration fixtures
//! - Flow documents
//! - Router construction against a mock voice provider

// Not every test binary uses every fixture
#![allow(dead_code)]

pub mod flow_fixtures;

pub use flow_fixtures::*;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use serde_json::Value;
use tower::util::ServiceExt;

use flowcall_gateway::{
    ServerConfig,
    config::ResponseMode,
    provider::{RetellClient, VoiceProvider},
    routes,
    flow::CallSession,
    session::{MemorySessionRegistry, SessionError, SessionRegistry, SessionResult},
    state::AppState,
};

/// Configuration pointing at a mock provider
pub fn test_config(base_url: &str, mode: ResponseMode) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.host = "127.0.0.1".to_string();
    config.provider_api_key = Some("test-api-key".to_string());
    config.provider_agent_id = Some("agent-test".to_string());
    config.provider_base_url = base_url.to_string();
    config.provider_timeout_seconds = 5;
    config.response_mode = mode;
    config
}

/// Router plus the session registry it uses
pub struct TestApp {
    pub router: Router,
    pub sessions: Arc<MemorySessionRegistry>,
}

/// Build the full application with an in-memory registry
pub fn build_app(config: ServerConfig) -> TestApp {
    let sessions = Arc::new(memory_registry(&config));
    let registry: Arc<dyn SessionRegistry> = sessions.clone();

    TestApp {
        router: build_router(config, registry),
        sessions,
    }
}

/// In-memory registry sized from configuration
pub fn memory_registry(config: &ServerConfig) -> MemorySessionRegistry {
    MemorySessionRegistry::new(
        config.session_max_capacity,
        Duration::from_secs(config.session_ttl_seconds),
    )
}

/// Build the application around any session registry
pub fn build_router(config: ServerConfig, sessions: Arc<dyn SessionRegistry>) -> Router {
    let provider: Option<Arc<dyn VoiceProvider>> = config.provider_api_key.clone().map(|key| {
        Arc::new(RetellClient::new(
            key,
            config.provider_base_url.clone(),
            Duration::from_secs(config.provider_timeout_seconds),
        )) as Arc<dyn VoiceProvider>
    });

    let state = AppState::with_components(config, sessions, provider);
    routes::create_app_router().with_state(state)
}

/// Registry whose backing store is always down
pub struct UnavailableRegistry;

#[async_trait]
impl SessionRegistry for UnavailableRegistry {
    async fn put(&self, _session: CallSession) -> SessionResult<()> {
        Err(SessionError::Unavailable("connection refused".to_string()))
    }

    async fn refresh(&self, _session: CallSession) -> SessionResult<bool> {
        Err(SessionError::Unavailable("connection refused".to_string()))
    }

    async fn get(&self, _call_id: &str) -> SessionResult<Option<CallSession>> {
        Err(SessionError::Unavailable("connection refused".to_string()))
    }

    async fn expire(&self, _call_id: &str, _ttl: Duration) -> SessionResult<bool> {
        Err(SessionError::Unavailable("connection refused".to_string()))
    }

    async fn remove(&self, _call_id: &str) -> SessionResult<()> {
        Err(SessionError::Unavailable("connection refused".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "unavailable"
    }
}

/// Registry that ends the call right after each lookup, as if a
/// `call_ended` event arrived while the turn was being answered
pub struct EndsCallOnLookup {
    pub inner: Arc<MemorySessionRegistry>,
}

#[async_trait]
impl SessionRegistry for EndsCallOnLookup {
    async fn put(&self, session: CallSession) -> SessionResult<()> {
        self.inner.put(session).await
    }

    async fn refresh(&self, session: CallSession) -> SessionResult<bool> {
        self.inner.refresh(session).await
    }

    async fn get(&self, call_id: &str) -> SessionResult<Option<CallSession>> {
        let found = self.inner.get(call_id).await?;
        self.inner.remove(call_id).await?;
        Ok(found)
    }

    async fn expire(&self, call_id: &str, ttl: Duration) -> SessionResult<bool> {
        self.inner.expire(call_id, ttl).await
    }

    async fn remove(&self, call_id: &str) -> SessionResult<()> {
        self.inner.remove(call_id).await
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Send a JSON POST through the router
pub async fn post_json(router: &Router, uri: &str, body: &Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    router.clone().oneshot(request).await.unwrap()
}

/// Send a GET through the router
pub async fn get(router: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    router.clone().oneshot(request).await.unwrap()
}

/// Read a response body as JSON
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
