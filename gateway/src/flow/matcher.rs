//! Deterministic branch matching for the custom-LLM webhook
//!
//! Given a conversation flow and the caller's latest utterance, pick the next
//! scripted line without consulting a language model:
//!
//! 1. first turn: the welcome message, utterance ignored
//! 2. otherwise: the first branch (authored order) with a keyword contained in
//!    the lowercased utterance
//! 3. no match: a clarification listing every branch title
//! 4. no flow bound to the call: a generic greeting

use serde::Serialize;

use super::definition::{Branch, ConversationFlow};

/// Spoken when a webhook turn arrives for a call with no bound flow
pub const FALLBACK_GREETING: &str = "Hello! Thank you for calling. How can I help you today?";

/// First line of the clarification reply, followed by the numbered branch titles
pub const CLARIFICATION_LEAD_IN: &str =
    "I'm sorry, I didn't quite catch that. Could you tell me which of these you need help with?";

/// How a reply was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Opening turn
    Welcome,
    /// Branch at this position matched
    Branch { index: usize },
    /// Nothing matched
    Clarification,
    /// No flow was available for the call
    NoActiveFlow,
}

/// A reply and the reason it was chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub outcome: MatchOutcome,
    pub text: String,
}

/// Branch matcher compiled from a conversation flow
///
/// Keywords are lowercased once at construction. Blank keywords are dropped
/// since they would match every utterance.
#[derive(Debug, Clone)]
pub struct BranchMatcher<'a> {
    flow: &'a ConversationFlow,
    keywords: Vec<Vec<String>>,
}

impl<'a> BranchMatcher<'a> {
    /// Prepare a matcher for `flow`
    pub fn new(flow: &'a ConversationFlow) -> Self {
        let keywords = flow
            .branches
            .iter()
            .map(|branch| {
                branch
                    .keywords
                    .iter()
                    .filter(|k| !k.trim().is_empty())
                    .map(|k| k.to_lowercase())
                    .collect()
            })
            .collect();

        Self { flow, keywords }
    }

    /// The flow this matcher was built from
    pub fn flow(&self) -> &ConversationFlow {
        self.flow
    }

    /// Index of the first branch matching `utterance`
    pub fn find_branch(&self, utterance: &str) -> Option<usize> {
        if utterance.is_empty() {
            return None;
        }

        let lowered = utterance.to_lowercase();
        self.keywords
            .iter()
            .position(|keywords| keywords.iter().any(|k| lowered.contains(k.as_str())))
    }

    /// Decide the next line for this turn
    pub fn reply(&self, utterance: &str, is_first_turn: bool) -> Reply {
        if is_first_turn {
            return Reply {
                outcome: MatchOutcome::Welcome,
                text: self.flow.welcome_message.clone(),
            };
        }

        match self.find_branch(utterance) {
            Some(index) => Reply {
                outcome: MatchOutcome::Branch { index },
                text: self.flow.branches[index].response.clone(),
            },
            None => Reply {
                outcome: MatchOutcome::Clarification,
                text: clarification_message(&self.flow.branches),
            },
        }
    }
}

/// Clarification reply listing branch titles in authored order
pub fn clarification_message(branches: &[Branch]) -> String {
    let mut lines = Vec::with_capacity(branches.len() + 1);
    lines.push(CLARIFICATION_LEAD_IN.to_string());
    for (i, branch) in branches.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, branch.title));
    }
    lines.join("\n")
}

/// Resolve a turn, degrading to the fallback greeting when `flow` is absent
pub fn resolve_turn(flow: Option<&ConversationFlow>, utterance: &str, is_first_turn: bool) -> Reply {
    match flow {
        Some(flow) => BranchMatcher::new(flow).reply(utterance, is_first_turn),
        None => Reply {
            outcome: MatchOutcome::NoActiveFlow,
            text: FALLBACK_GREETING.to_string(),
        },
    }
}

/// Next scripted line for a turn
pub fn next_response(flow: Option<&ConversationFlow>, utterance: &str, is_first_turn: bool) -> String {
    resolve_turn(flow, utterance, is_first_turn).text
}
