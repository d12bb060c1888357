//! API Tests
//!
//! Drives the browser-facing endpoints against a mocked voice provider:
//! health, agent configuration, call creation for each flow schema, and the
//! compile preview.

mod fixtures;

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flowcall_gateway::config::ResponseMode;
use flowcall_gateway::session::SessionRegistry;
use std::sync::Arc;

use fixtures::*;

#[tokio::test]
async fn test_health_check() {
    let app = build_app(test_config("http://127.0.0.1:9", ResponseMode::Prompt));

    let response = get(&app.router, "/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "OK");
    assert_eq!(body["apiKeyConfigured"], true);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_agent_config_never_exposes_key() {
    let app = build_app(test_config("http://127.0.0.1:9", ResponseMode::Prompt));

    let response = get(&app.router, "/api/agent-config").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["agentId"], "agent-test");
    assert_eq!(body["hasApiKey"], true);
    assert_eq!(body["version"], "v2-dynamic");
    assert!(!body.to_string().contains("test-api-key"));
}

#[tokio::test]
async fn test_create_call_with_node_flow() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/update-agent"))
        .and(header("authorization", "Bearer test-api-key"))
        .and(body_partial_json(json!({ "agent_id": "agent-test" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/create-web-call"))
        .and(body_partial_json(json!({ "agent_id": "agent-test" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(web_call_response("call-nodes")))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_app(test_config(&server.uri(), ResponseMode::Prompt));
    let response = post_json(
        &app.router,
        "/api/create-web-call",
        &json!({ "flowData": node_flow() }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["accessToken"], "token-call-nodes");
    assert_eq!(body["callId"], "call-nodes");
    assert_eq!(body["version"], "v2-dynamic");

    let instructions = body["instructions"].as_str().unwrap();
    assert!(instructions.starts_with("You are a helpful AI assistant."));
    assert!(instructions.contains("GREETING: \"Thanks for calling Acme!\""));
    assert!(instructions.contains("- For New customer: \"Welcome aboard.\""));
    assert!(instructions.contains("- Hours: \"We are open 9 to 5.\""));

    // Node flows are not bound to the call
    assert!(app.sessions.get("call-nodes").await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_call_with_branched_flow_prompt_mode() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/update-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/create-web-call"))
        .and(body_partial_json(json!({ "metadata": { "response_mode": "prompt" } })))
        .respond_with(ResponseTemplate::new(201).set_body_json(web_call_response("call-branched")))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_app(test_config(&server.uri(), ResponseMode::Prompt));
    let response = post_json(
        &app.router,
        "/api/create-web-call",
        &json!({ "conversationFlow": branched_flow() }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["callId"], "call-branched");

    let prompt = body["instructions"].as_str().unwrap();
    assert!(prompt.contains("WELCOME MESSAGE:"));
    assert!(prompt.contains("1. Billing"));
    assert!(prompt.contains("2. Technical support"));

    let session = app.sessions.get("call-branched").await.unwrap().unwrap();
    assert_eq!(session.flow.branches.len(), 2);
    assert_eq!(session.turn_count, 0);
}

#[tokio::test]
async fn test_create_call_with_branched_flow_webhook_mode_skips_agent_update() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/update-agent"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/create-web-call"))
        .and(body_partial_json(json!({ "metadata": { "response_mode": "webhook" } })))
        .respond_with(ResponseTemplate::new(201).set_body_json(web_call_response("call-hook")))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_app(test_config(&server.uri(), ResponseMode::Webhook));
    let response = post_json(
        &app.router,
        "/api/create-web-call",
        &json!({ "conversationFlow": branched_flow() }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.sessions.get("call-hook").await.unwrap().is_some());
}

#[tokio::test]
async fn test_create_call_webhook_mode_fails_when_session_cannot_be_bound() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/create-web-call"))
        .respond_with(ResponseTemplate::new(201).set_body_json(web_call_response("call-hook")))
        .expect(1)
        .mount(&server)
        .await;

    let router = build_router(
        test_config(&server.uri(), ResponseMode::Webhook),
        Arc::new(UnavailableRegistry),
    );
    let response = post_json(
        &router,
        "/api/create-web-call",
        &json!({ "conversationFlow": branched_flow() }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Session store unavailable");
}

#[tokio::test]
async fn test_create_call_prompt_mode_survives_session_store_outage() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/update-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/create-web-call"))
        .respond_with(ResponseTemplate::new(201).set_body_json(web_call_response("call-prompt")))
        .expect(1)
        .mount(&server)
        .await;

    let router = build_router(
        test_config(&server.uri(), ResponseMode::Prompt),
        Arc::new(UnavailableRegistry),
    );
    let response = post_json(
        &router,
        "/api/create-web-call",
        &json!({ "conversationFlow": branched_flow() }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["callId"], "call-prompt");
}

#[tokio::test]
async fn test_create_call_without_flow_uses_default_agent() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/update-agent"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/create-web-call"))
        .and(body_partial_json(json!({ "agent_id": "agent-test" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(web_call_response("call-plain")))
        .expect(1)
        .mount(&server)
        .await;

    let app = build_app(test_config(&server.uri(), ResponseMode::Prompt));
    let response = post_json(&app.router, "/api/create-web-call", &json!({})).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["callId"], "call-plain");
    assert!(body.get("instructions").is_none());
}

#[tokio::test]
async fn test_create_call_malformed_flow_is_rejected_before_provider() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/create-web-call"))
        .respond_with(ResponseTemplate::new(201).set_body_json(web_call_response("never")))
        .expect(0)
        .mount(&server)
        .await;

    let app = build_app(test_config(&server.uri(), ResponseMode::Prompt));
    let response = post_json(
        &app.router,
        "/api/create-web-call",
        &json!({ "flowData": { "nodes": [ { "type": "welcome" } ] } }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Malformed"));
}

#[tokio::test]
async fn test_create_call_provider_failure_hides_details() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/update-agent"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/create-web-call"))
        .respond_with(ResponseTemplate::new(500).set_body_string("secret internal trace"))
        .mount(&server)
        .await;

    let app = build_app(test_config(&server.uri(), ResponseMode::Prompt));
    let response = post_json(
        &app.router,
        "/api/create-web-call",
        &json!({ "flowData": node_flow() }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Call could not be started");
    assert!(!body.to_string().contains("secret internal trace"));
}

#[tokio::test]
async fn test_create_call_agent_update_failure_stops_call() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/update-agent"))
        .respond_with(ResponseTemplate::new(404).set_body_string("agent not found"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/create-web-call"))
        .respond_with(ResponseTemplate::new(201).set_body_json(web_call_response("never")))
        .expect(0)
        .mount(&server)
        .await;

    let app = build_app(test_config(&server.uri(), ResponseMode::Prompt));
    let response = post_json(
        &app.router,
        "/api/create-web-call",
        &json!({ "flowData": node_flow() }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_create_call_without_api_key() {
    let mut config = test_config("http://127.0.0.1:9", ResponseMode::Prompt);
    config.provider_api_key = None;
    let app = build_app(config);

    let response = post_json(&app.router, "/api/create-web-call", &json!({})).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("RETELL_API_KEY"));

    let health = body_json(get(&app.router, "/").await).await;
    assert_eq!(health["apiKeyConfigured"], false);
}

#[tokio::test]
async fn test_create_call_without_agent_id() {
    let mut config = test_config("http://127.0.0.1:9", ResponseMode::Prompt);
    config.provider_agent_id = None;
    let app = build_app(config);

    let response = post_json(&app.router, "/api/create-web-call", &json!({})).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("RETELL_AGENT_ID"));
}

#[tokio::test]
async fn test_compile_preview_node_flow() {
    let app = build_app(test_config("http://127.0.0.1:9", ResponseMode::Prompt));

    let mut flow = node_flow();
    flow["nodes"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "id": "9", "type": "welcome", "title": "Second", "description": "Ignored" }));

    let response = post_json(&app.router, "/api/flow/compile", &json!({ "flowData": flow })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["format"], "nodes");
    assert!(body["text"].as_str().unwrap().contains("Thanks for calling Acme!"));
    assert!(!body["text"].as_str().unwrap().contains("Ignored"));
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_compile_preview_branched_flow_with_warning() {
    let app = build_app(test_config("http://127.0.0.1:9", ResponseMode::Prompt));

    let flow = json!({
        "welcomeMessage": "Hi",
        "branches": [ { "title": "Orphan", "keywords": [], "response": "Never said" } ]
    });
    let response = post_json(
        &app.router,
        "/api/flow/compile",
        &json!({ "conversationFlow": flow }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["format"], "branched");
    assert!(!body["warnings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_compile_preview_requires_flow() {
    let app = build_app(test_config("http://127.0.0.1:9", ResponseMode::Prompt));

    let response = post_json(&app.router, "/api/flow/compile", &json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
