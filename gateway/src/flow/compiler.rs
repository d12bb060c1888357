//! Flow compiler
//!
//! Turns a flow document into the text handed to the voice provider's agent:
//! - node flows become a sectioned instruction block (greeting, caller types,
//!   additional responses)
//! - branched flows become an explicit branch prompt for an LLM-backed agent
//!
//! Output is a pure function of the input. Sections keep authored order.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::definition::{ConversationFlow, FlowDocument, FlowNode, NodeKind, parse_flow_nodes};
use super::error::FlowResult;

/// Opening line of every node-flow instruction block
pub const INSTRUCTIONS_PREAMBLE: &str =
    "You are a helpful AI assistant. Follow this conversation flow:\n\n";

/// Closing line of every node-flow instruction block
pub const INSTRUCTIONS_CLOSING: &str =
    "\nAlways be helpful, professional, and follow the conversation flow above.";

/// Opening line of every branched prompt
pub const BRANCHED_PREAMBLE: &str =
    "You are a helpful AI voice assistant. Follow this conversation flow exactly.\n\n";

/// Authoring schema a compiled flow came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowFormat {
    Nodes,
    Branched,
}

/// Instruction text plus what the compiler dropped on the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstructions {
    pub text: String,
    /// Ids of welcome nodes ignored because an earlier one won
    pub ignored_welcome_nodes: Vec<String>,
}

/// Compiled text for either schema, with non-fatal warnings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledFlow {
    pub format: FlowFormat,
    pub text: String,
    pub warnings: Vec<String>,
}

/// Flow compiler
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowCompiler;

impl FlowCompiler {
    /// Create a new flow compiler
    pub fn new() -> Self {
        Self
    }

    /// Compile a node flow into agent instructions
    pub fn compile_instructions(&self, nodes: &[FlowNode]) -> String {
        self.compile_instructions_report(nodes).text
    }

    /// Compile a node flow, reporting ignored welcome nodes
    ///
    /// The first welcome node wins; later ones are logged and listed in the
    /// report rather than rejected.
    pub fn compile_instructions_report(&self, nodes: &[FlowNode]) -> CompiledInstructions {
        let mut text = String::from(INSTRUCTIONS_PREAMBLE);
        let mut ignored_welcome_nodes = Vec::new();

        let mut welcome_nodes = nodes.iter().filter(|n| n.kind == NodeKind::Welcome);
        if let Some(welcome) = welcome_nodes.next() {
            text.push_str(&format!("GREETING: \"{}\"\n\n", welcome.description));

            for duplicate in welcome_nodes {
                warn!(
                    node_id = %duplicate.id,
                    kept_node_id = %welcome.id,
                    "Ignoring duplicate welcome node; the first one wins"
                );
                ignored_welcome_nodes.push(duplicate.id.clone());
            }
        }

        let caller_types: Vec<&FlowNode> = nodes
            .iter()
            .filter(|n| n.kind == NodeKind::CallerType)
            .collect();
        if !caller_types.is_empty() {
            text.push_str("CALLER TYPE RESPONSES:\n");
            for node in caller_types {
                text.push_str(&format!("- For {}: \"{}\"\n", node.title, node.description));
            }
            text.push('\n');
        }

        let responses: Vec<&FlowNode> = nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Response)
            .collect();
        if !responses.is_empty() {
            text.push_str("ADDITIONAL RESPONSES:\n");
            for node in responses {
                text.push_str(&format!("- {}: \"{}\"\n", node.title, node.description));
            }
        }

        text.push_str(INSTRUCTIONS_CLOSING);

        debug!(
            node_count = nodes.len(),
            instructions_len = text.len(),
            "Compiled flow instructions"
        );

        CompiledInstructions {
            text,
            ignored_welcome_nodes,
        }
    }

    /// Parse and compile an untyped node flow document
    pub fn compile_nodes(&self, value: &Value) -> FlowResult<String> {
        let nodes = parse_flow_nodes(value)?;
        Ok(self.compile_instructions(&nodes))
    }

    /// Compile a branched flow into an advisory prompt for an LLM agent
    ///
    /// The prompt asks the model to match branches; nothing enforces it.
    /// Use [`super::BranchMatcher`] when the reply must be deterministic.
    pub fn compile_branched_prompt(&self, flow: &ConversationFlow) -> String {
        let mut text = String::from(BRANCHED_PREAMBLE);

        text.push_str("WELCOME MESSAGE:\n");
        text.push_str(&format!("\"{}\"\n\n", flow.welcome_message));

        if !flow.branches.is_empty() {
            text.push_str("CONVERSATION BRANCHES:\n");
            for (i, branch) in flow.branches.iter().enumerate() {
                let keywords = if branch.keywords.is_empty() {
                    "(none)".to_string()
                } else {
                    branch
                        .keywords
                        .iter()
                        .map(|k| format!("\"{k}\""))
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                text.push_str(&format!("{}. {}\n", i + 1, branch.title));
                text.push_str(&format!("   Keywords: {keywords}\n"));
                text.push_str(&format!("   Response: \"{}\"\n", branch.response));
            }
            text.push('\n');
        }

        text.push_str("INSTRUCTIONS:\n");
        text.push_str("- Always start the conversation by saying the welcome message exactly as written.\n");
        text.push_str("- Match what the caller says to the closest branch using its keywords.\n");
        text.push_str("- When a branch matches, reply with its response exactly as written. Do not paraphrase.\n");
        text.push_str("- If nothing matches, ask the caller to clarify and list the available options.");

        text
    }

    /// Compile whichever schema the document uses
    pub fn compile_document(&self, document: &FlowDocument) -> CompiledFlow {
        match document {
            FlowDocument::Nodes(nodes) => {
                let report = self.compile_instructions_report(nodes);
                let warnings = report
                    .ignored_welcome_nodes
                    .iter()
                    .map(|id| format!("Duplicate welcome node '{id}' ignored; the first welcome node is used"))
                    .collect();
                CompiledFlow {
                    format: FlowFormat::Nodes,
                    text: report.text,
                    warnings,
                }
            }
            FlowDocument::Branched(flow) => CompiledFlow {
                format: FlowFormat::Branched,
                text: self.compile_branched_prompt(flow),
                warnings: flow.validate(),
            },
        }
    }
}
