//! Conversation history as delivered by the voice provider on each webhook turn

use serde::{Deserialize, Serialize};

/// Speaker of a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "assistant")]
    Agent,
    #[serde(other)]
    Other,
}

/// One entry of the conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl Utterance {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            content: content.into(),
        }
    }
}

/// What the matcher needs to know about the current turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnContext {
    /// Content of the most recent user entry, empty when the user has not spoken
    pub latest_user_utterance: String,
    /// Number of user entries in the history
    pub user_turns: u32,
    /// True until the agent has said anything
    pub is_first_turn: bool,
}

impl TurnContext {
    /// Derive the turn context from the full history
    pub fn from_history(history: &[Utterance]) -> Self {
        let latest_user_utterance = history
            .iter()
            .rev()
            .find(|u| u.role == Role::User)
            .map(|u| u.content.clone())
            .unwrap_or_default();

        let user_turns = saturating_turns(history.iter().filter(|u| u.role == Role::User).count());
        let is_first_turn = !history.iter().any(|u| u.role == Role::Agent);

        Self {
            latest_user_utterance,
            user_turns,
            is_first_turn,
        }
    }
}

/// Turn counts saturate instead of wrapping
fn saturating_turns(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
