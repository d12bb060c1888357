//! Flow documents as the browser editor sends them

use serde_json::{Value, json};

/// Node flow with a welcome node, two caller types and one response
pub fn node_flow() -> Value {
    json!({
        "nodes": [
            { "id": "1", "type": "welcome", "title": "Welcome", "description": "Thanks for calling Acme!" },
            { "id": "2", "type": "caller-type", "title": "New customer", "description": "Welcome aboard." },
            { "id": "3", "type": "caller-type", "title": "Existing customer", "description": "Good to hear from you again." },
            { "id": "4", "type": "response", "title": "Hours", "description": "We are open 9 to 5." }
        ]
    })
}

/// Branched flow with billing and support branches
pub fn branched_flow() -> Value {
    json!({
        "welcomeMessage": "Welcome to Acme support. Are you calling about billing or a technical issue?",
        "branches": [
            {
                "title": "Billing",
                "keywords": ["bill", "invoice", "payment"],
                "response": "I can help with billing. What is your account number?"
            },
            {
                "title": "Technical support",
                "keywords": ["broken", "error", "not working"],
                "response": "Sorry to hear that. Which device are you using?"
            }
        ]
    })
}

/// Provider response for a created web call
pub fn web_call_response(call_id: &str) -> Value {
    json!({
        "access_token": format!("token-{call_id}"),
        "call_id": call_id,
        "agent_id": "agent-test"
    })
}
