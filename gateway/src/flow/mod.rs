//! Conversation flows for scripted voice calls
//!
//! A flow document authored in the browser is compiled into text for the
//! voice provider's agent, and, for branched flows, bound to the call so that
//! each webhook turn can be answered deterministically.
//!
//! ```text
//! flow document (JSON)
//!        │ definition::FlowDocument::parse
//!        ▼
//!  FlowNode[] ──► FlowCompiler::compile_instructions ──► agent prompt
//!  ConversationFlow ──► FlowCompiler::compile_branched_prompt ──► agent prompt
//!        │
//!        └──► CallSession (session registry) ──► BranchMatcher per turn
//! ```
//!
//! # Example
//!
//! ```rust
//! use flowcall_gateway::flow::{Branch, ConversationFlow, next_response};
//!
//! let flow = ConversationFlow::new("Thanks for calling!")
//!     .with_branch(Branch::new("Billing", ["invoice"], "Let me check your invoice."));
//!
//! assert_eq!(next_response(Some(&flow), "anything", true), "Thanks for calling!");
//! assert_eq!(next_response(Some(&flow), "My INVOICE is wrong", false), "Let me check your invoice.");
//! ```

pub mod compiler;
pub mod definition;
pub mod error;
pub mod matcher;
pub mod transcript;

pub use compiler::{CompiledFlow, CompiledInstructions, FlowCompiler, FlowFormat};
pub use definition::{
    Branch, CallSession, ConversationFlow, FlowDocument, FlowNode, NodeKind,
    parse_conversation_flow, parse_flow_nodes,
};
pub use error::{FlowError, FlowResult};
pub use matcher::{
    BranchMatcher, CLARIFICATION_LEAD_IN, FALLBACK_GREETING, MatchOutcome, Reply,
    clarification_message, next_response, resolve_turn,
};
pub use transcript::{Role, TurnContext, Utterance};
