//! Flow error types
//!
//! Errors raised while reading a client-authored flow document. Matching never
//! fails: an unmatched utterance or an unbound call both resolve to a scripted
//! fallback, so the only failure surface is the document shape itself.

use thiserror::Error;

/// Result type for flow operations
pub type FlowResult<T> = Result<T, FlowError>;

/// Error type for flow parsing and compilation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// The document violates the minimal structural contract
    #[error("Malformed flow: {0}")]
    MalformedFlow(String),

    /// A node at the given position is not an object with the required fields
    #[error("Malformed flow node at index {index}: {reason}")]
    MalformedNode { index: usize, reason: String },

    /// A branch at the given position is not an object with the required fields
    #[error("Malformed branch at index {index}: {reason}")]
    MalformedBranch { index: usize, reason: String },
}

impl FlowError {
    /// Create a `MalformedFlow` error from any displayable reason
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedFlow(reason.into())
    }

    /// Whether this error describes a structurally invalid document.
    ///
    /// Every current variant does; callers use this to map onto a 400.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedFlow(_) | Self::MalformedNode { .. } | Self::MalformedBranch { .. }
        )
    }
}
