//! Login state machine.

use serde::{Deserialize, Serialize};

/// Where a session stands in the login flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No identity; a login may be started.
    #[default]
    Anonymous,
    /// A provider or wallet prompt is open.
    Authenticating,
    /// An identity is available.
    Authenticated,
}

impl SessionState {
    /// State after a login request. Already-authenticated sessions stay put.
    #[must_use]
    pub fn begin_login(self) -> Self {
        match self {
            Self::Authenticated => Self::Authenticated,
            Self::Anonymous | Self::Authenticating => Self::Authenticating,
        }
    }

    /// State after the provider answered.
    #[must_use]
    pub fn finish_login(self, success: bool) -> Self {
        match (self, success) {
            (Self::Authenticating, true) => Self::Authenticated,
            (Self::Authenticating, false) => Self::Anonymous,
            (other, _) => other,
        }
    }

    /// State after logout or expiry.
    #[must_use]
    pub fn end(self) -> Self {
        Self::Anonymous
    }

    /// Returns true once an identity is available.
    #[must_use]
    pub fn is_authenticated(self) -> bool {
        self == Self::Authenticated
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Authenticating => write!(f, "authenticating"),
            Self::Authenticated => write!(f, "authenticated"),
        }
    }
}
