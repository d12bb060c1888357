//! Flow document types
//!
//! Two authoring schemas reach the gateway from the browser:
//!
//! - a flat node list (`flowData.nodes`) where each node carries a `type`,
//!   a `title` and a `description`, compiled into agent instructions
//! - a branched conversation flow (`welcomeMessage` + keyword `branches`),
//!   used both for the advisory branch prompt and for deterministic matching
//!
//! Both are parsed from untyped JSON through the adapter functions in this
//! module so that a bad document surfaces as a [`FlowError`] with a position
//! instead of a generic deserialization failure.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use super::error::{FlowError, FlowResult};

/// Kind of an authored flow node
///
/// Unknown kinds are preserved as [`NodeKind::Other`] and ignored by the
/// instruction compiler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    /// Greeting spoken when the call opens
    Welcome,
    /// Response tailored to a type of caller
    CallerType,
    /// Any other scripted response
    Response,
    /// Kind not understood by this gateway
    Other(String),
}

impl NodeKind {
    /// Parse from the authoring string
    pub fn parse(s: &str) -> Self {
        match s {
            "welcome" => Self::Welcome,
            "caller-type" => Self::CallerType,
            "response" => Self::Response,
            other => Self::Other(other.to_string()),
        }
    }

    /// Authoring string for this kind
    pub fn as_str(&self) -> &str {
        match self {
            Self::Welcome => "welcome",
            Self::CallerType => "caller-type",
            Self::Response => "response",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single authored element of a node-based flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowNode {
    /// Opaque identifier, unique within a flow
    #[serde(default)]
    pub id: String,

    /// Node kind (`type` in the browser payload)
    #[serde(rename = "type", alias = "kind")]
    pub kind: NodeKind,

    /// Short human-readable label
    #[serde(default)]
    pub title: String,

    /// Literal text to speak for this node
    pub description: String,
}

impl FlowNode {
    /// Create a node
    pub fn new(
        id: impl Into<String>,
        kind: NodeKind,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// A keyword-triggered scripted response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    /// Human-readable label, listed in clarification prompts
    pub title: String,

    /// Trigger keywords, matched case-insensitively as substrings
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Text returned verbatim when the branch is selected
    pub response: String,
}

impl Branch {
    /// Create a branch
    pub fn new<I, S>(title: impl Into<String>, keywords: I, response: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            keywords: keywords.into_iter().map(Into::into).collect(),
            response: response.into(),
        }
    }

    /// Whether any keyword can ever match an utterance
    pub fn is_reachable(&self) -> bool {
        self.keywords.iter().any(|k| !k.trim().is_empty())
    }
}

/// Branched conversation flow with an opening line and ordered branches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationFlow {
    /// Always spoken first
    pub welcome_message: String,

    /// Evaluated in authored order, first match wins
    #[serde(default)]
    pub branches: Vec<Branch>,
}

impl ConversationFlow {
    /// Create a flow with no branches
    pub fn new(welcome_message: impl Into<String>) -> Self {
        Self {
            welcome_message: welcome_message.into(),
            branches: Vec::new(),
        }
    }

    /// Append a branch
    pub fn with_branch(mut self, branch: Branch) -> Self {
        self.branches.push(branch);
        self
    }

    /// Non-fatal problems with the flow
    ///
    /// Branches without a usable keyword are kept (they still show up in the
    /// clarification list) but can never be selected by the matcher.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.branches.is_empty() {
            warnings.push("Flow has no branches; every turn after the greeting asks for clarification".to_string());
        }

        for (i, branch) in self.branches.iter().enumerate() {
            if !branch.is_reachable() {
                warnings.push(format!(
                    "Branch {} ('{}') has no non-empty keywords and can never match",
                    i + 1,
                    branch.title
                ));
            }
        }

        warnings
    }
}

/// Ephemeral binding between a live call and its flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSession {
    /// Call identifier assigned by the voice provider
    pub call_id: String,

    /// Flow bound at call creation, read-only afterwards
    pub flow: Arc<ConversationFlow>,

    /// User turns observed so far
    #[serde(default)]
    pub turn_count: u32,
}

impl CallSession {
    /// Bind a flow to a call
    pub fn new(call_id: impl Into<String>, flow: impl Into<Arc<ConversationFlow>>) -> Self {
        Self {
            call_id: call_id.into(),
            flow: flow.into(),
            turn_count: 0,
        }
    }

    /// Copy of this session with an updated turn count
    pub fn with_turn_count(&self, turn_count: u32) -> Self {
        Self {
            call_id: self.call_id.clone(),
            flow: Arc::clone(&self.flow),
            turn_count,
        }
    }
}

/// A flow document in either authoring schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowDocument {
    /// Flat node list
    Nodes(Vec<FlowNode>),
    /// Welcome message plus keyword branches
    Branched(ConversationFlow),
}

impl FlowDocument {
    /// Detect the schema and parse
    ///
    /// An object carrying `welcomeMessage` is a branched flow; anything else
    /// is treated as a node list.
    pub fn parse(value: &Value) -> FlowResult<Self> {
        if value.get("welcomeMessage").is_some() {
            parse_conversation_flow(value).map(Self::Branched)
        } else {
            parse_flow_nodes(value).map(Self::Nodes)
        }
    }
}

/// Parse a node-based flow
///
/// Accepts a bare array or the `{ "nodes": [...] }` envelope the browser
/// editor sends. Each node needs a string `type` (or `kind`) and a string
/// `description`; `id` and `title` are optional. Nothing else is checked.
pub fn parse_flow_nodes(value: &Value) -> FlowResult<Vec<FlowNode>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("nodes") {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(FlowError::malformed("'nodes' must be an array")),
            None => {
                return Err(FlowError::malformed(
                    "expected an array of nodes or an object with a 'nodes' array",
                ));
            }
        },
        _ => {
            return Err(FlowError::malformed(
                "expected an array of nodes or an object with a 'nodes' array",
            ));
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_node(index, item))
        .collect()
}

fn parse_node(index: usize, item: &Value) -> FlowResult<FlowNode> {
    let obj = item.as_object().ok_or_else(|| FlowError::MalformedNode {
        index,
        reason: "expected an object".to_string(),
    })?;

    let kind = match obj.get("type").or_else(|| obj.get("kind")) {
        Some(Value::String(s)) => NodeKind::parse(s),
        Some(_) => {
            return Err(FlowError::MalformedNode {
                index,
                reason: "'type' must be a string".to_string(),
            });
        }
        None => {
            return Err(FlowError::MalformedNode {
                index,
                reason: "missing 'type'".to_string(),
            });
        }
    };

    let description = match obj.get("description") {
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(FlowError::MalformedNode {
                index,
                reason: "'description' must be a string".to_string(),
            });
        }
        None => {
            return Err(FlowError::MalformedNode {
                index,
                reason: "missing 'description'".to_string(),
            });
        }
    };

    Ok(FlowNode {
        id: loose_string(obj, "id"),
        kind,
        title: loose_string(obj, "title"),
        description,
    })
}

/// Optional label field; editors emit numeric ids, anything else reads as empty
fn loose_string(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Parse a branched conversation flow
///
/// Requires a string `welcomeMessage` and, when present, a `branches` array
/// whose entries carry string `title` and `response` and an optional array of
/// string `keywords`.
pub fn parse_conversation_flow(value: &Value) -> FlowResult<ConversationFlow> {
    let obj = value
        .as_object()
        .ok_or_else(|| FlowError::malformed("conversation flow must be an object"))?;

    let welcome_message = match obj.get("welcomeMessage") {
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(FlowError::malformed("'welcomeMessage' must be a string")),
        None => return Err(FlowError::malformed("missing 'welcomeMessage'")),
    };

    let branches = match obj.get("branches") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| parse_branch(index, item))
            .collect::<FlowResult<Vec<_>>>()?,
        Some(_) => return Err(FlowError::malformed("'branches' must be an array")),
    };

    Ok(ConversationFlow {
        welcome_message,
        branches,
    })
}

fn parse_branch(index: usize, item: &Value) -> FlowResult<Branch> {
    let obj = item.as_object().ok_or_else(|| FlowError::MalformedBranch {
        index,
        reason: "expected an object".to_string(),
    })?;

    let required = |key: &str| -> FlowResult<String> {
        match obj.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(FlowError::MalformedBranch {
                index,
                reason: format!("'{key}' must be a string"),
            }),
            None => Err(FlowError::MalformedBranch {
                index,
                reason: format!("missing '{key}'"),
            }),
        }
    };

    let title = required("title")?;
    let response = required("response")?;

    let keywords = match obj.get("keywords") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| FlowError::MalformedBranch {
                    index,
                    reason: "'keywords' must contain only strings".to_string(),
                })
            })
            .collect::<FlowResult<Vec<_>>>()?,
        Some(_) => {
            return Err(FlowError::MalformedBranch {
                index,
                reason: "'keywords' must be an array".to_string(),
            });
        }
    };

    Ok(Branch {
        title,
        keywords,
        response,
    })
}
