//! Server Startup Tests
//!
//! Builds application state the way `main` does and serves the router on a
//! real socket, then walks a call from creation through webhook turns.

mod fixtures;

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flowcall_gateway::config::{ResponseMode, SessionBackend};
use flowcall_gateway::{ServerConfig, routes, state::AppState};

use fixtures::*;

/// Serve the app on an ephemeral port and return its address
async fn spawn_server(config: ServerConfig) -> SocketAddr {
    let state = AppState::new(config).await.unwrap();
    let app = routes::create_app_router().with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_state_without_api_key_disables_provider() {
    let mut config = ServerConfig::default();
    config.provider_api_key = None;

    let state = AppState::new(config).await.unwrap();
    assert!(state.provider.is_none());
    assert_eq!(state.sessions.backend_name(), "memory");
}

#[cfg(not(feature = "redis-sessions"))]
#[tokio::test]
async fn test_redis_backend_requires_feature() {
    let mut config = ServerConfig::default();
    config.session_backend = SessionBackend::Redis;
    config.redis_url = Some("redis://127.0.0.1:6379".to_string());

    assert!(AppState::new(config).await.is_err());
}

#[tokio::test]
async fn test_full_call_lifecycle_over_http() {
    let provider = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/create-web-call"))
        .respond_with(ResponseTemplate::new(201).set_body_json(web_call_response("call-live")))
        .expect(1)
        .mount(&provider)
        .await;

    let addr = spawn_server(test_config(&provider.uri(), ResponseMode::Webhook)).await;
    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    let created: Value = timeout(
        Duration::from_secs(5),
        client
            .post(format!("{base}/api/create-web-call"))
            .json(&json!({ "conversationFlow": branched_flow() }))
            .send(),
    )
    .await
    .unwrap()
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(created["callId"], "call-live");

    let turn = |history: Value| {
        let client = client.clone();
        let url = format!("{base}/api/webhook/llm");
        async move {
            client
                .post(url)
                .json(&json!({ "callId": "call-live", "messageHistory": history }))
                .send()
                .await
                .unwrap()
                .json::<Value>()
                .await
                .unwrap()
        }
    };

    let greeting = turn(json!([])).await;
    assert!(greeting["response"].as_str().unwrap().starts_with("Welcome to Acme"));

    let billing = turn(json!([
        { "role": "agent", "content": greeting["response"] },
        { "role": "user", "content": "I need help with a payment" }
    ]))
    .await;
    assert_eq!(
        billing["response"],
        "I can help with billing. What is your account number?"
    );

    let ended = client
        .post(format!("{base}/api/webhook/call-events"))
        .json(&json!({ "event": "call_analyzed", "call": { "call_id": "call-live" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(ended.status(), reqwest::StatusCode::NO_CONTENT);
}
