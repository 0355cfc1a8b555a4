//! Widget error types.

use bx_actor::ActorError;
use bx_identity::AuthError;
use thiserror::Error;

/// Errors returned to the widget's caller.
///
/// Login and fetch failures are turned into view state instead; only misuse
/// and setup problems surface here.
#[derive(Error, Debug)]
pub enum WidgetError {
    /// A fetch was requested before any session was established.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The configuration is missing a value or holds an invalid one.
    #[error("configuration error: {0}")]
    Config(String),

    /// Identity setup failed.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The replica channel could not be set up.
    #[error("actor error: {0}")]
    Actor(#[from] ActorError),
}

impl From<config::ConfigError> for WidgetError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

/// Result type for widget operations.
pub type Result<T> = std::result::Result<T, WidgetError>;
