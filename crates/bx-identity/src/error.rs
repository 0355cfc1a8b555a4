//! Error types for identity operations.

use thiserror::Error;

/// Errors that can occur while obtaining or persisting an identity.
#[derive(Debug, Error)]
pub enum AuthError {
    /// An identity was requested before any successful login.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The user dismissed the provider or declined the wallet connection.
    #[error("login cancelled by the user")]
    Cancelled,

    /// The provider answered with a failure.
    #[error("identity provider failure: {0}")]
    ProviderFailure(String),

    /// No authorizer understands the given provider URL.
    #[error("unsupported identity provider: {0}")]
    UnsupportedProvider(String),

    /// The credential handed back by the provider is unusable.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// A wallet login was attempted but no wallet extension is available.
    #[error("no wallet extension available")]
    WalletUnavailable,

    /// The session store could not be located or written.
    #[error("session store error: {0}")]
    Store(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored session could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AuthError {
    /// Returns true when the failure came from the provider side of a login
    /// (cancellation included) rather than from local misuse or storage.
    #[must_use]
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Self::Cancelled
                | Self::ProviderFailure(_)
                | Self::UnsupportedProvider(_)
                | Self::InvalidCredential(_)
                | Self::WalletUnavailable
        )
    }
}

/// A specialized Result type for identity operations.
pub type Result<T> = std::result::Result<T, AuthError>;
