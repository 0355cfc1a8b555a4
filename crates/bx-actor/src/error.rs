//! # Actor Errors
//!
//! Error types for actor creation and remote calls.

use thiserror::Error;

/// Failures of the request channel itself.
#[derive(Error, Debug)]
pub enum ActorError {
    /// The agent could not reach the replica or the replica rejected the
    /// request.
    #[error("agent error: {0}")]
    Agent(#[from] ic_agent::AgentError),

    /// A transport-level failure reported by a non-agent transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// The call arguments could not be Candid-encoded.
    #[error("failed to encode arguments: {0}")]
    Encode(candid::Error),

    /// The reply did not match the declared interface.
    #[error("failed to decode reply: {0}")]
    Decode(candid::Error),

    /// The replica URL is unusable.
    #[error("invalid replica url: {0}")]
    InvalidUrl(String),
}

/// Result type for channel operations.
pub type ActorResult<T> = Result<T, ActorError>;

/// Why `get_holdings_summary` produced no summary.
#[derive(Error, Debug)]
pub enum CallError {
    /// The canister answered with its `Err` variant.
    #[error("remote error: {0}")]
    Remote(String),

    /// The call never produced a well-formed reply.
    #[error(transparent)]
    Transport(#[from] ActorError),
}

impl CallError {
    /// Text to classify for display: the remote message, or the transport
    /// error's own description.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Remote(message) => message.clone(),
            Self::Transport(e) => e.to_string(),
        }
    }

    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Remote(_) => "remote",
            Self::Transport(_) => "transport",
        }
    }

    /// Returns true if the canister itself reported the failure.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}
