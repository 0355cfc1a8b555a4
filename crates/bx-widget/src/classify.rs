//! Maps failure text to the message users see.

use std::fmt;

/// Shown when the failure mentions cycles.
pub const INSUFFICIENT_CYCLES_MESSAGE: &str =
    "The aggregator is out of cycles. Please top up the canister and retry.";

/// Shown for every other failure.
pub const GENERIC_ERROR_MESSAGE: &str =
    "Could not load your holdings. Please try again later.";

/// Category of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The canister or replica ran short of cycles.
    InsufficientCycles,
    /// Anything else.
    Other,
}

impl ErrorClass {
    /// Classifies a remote or transport error message. Case-insensitive
    /// match on `cycles`.
    #[must_use]
    pub fn classify(message: &str) -> Self {
        if message.to_lowercase().contains("cycles") {
            Self::InsufficientCycles
        } else {
            Self::Other
        }
    }

    /// The user-facing message for this class.
    #[must_use]
    pub fn user_message(self) -> &'static str {
        match self {
            Self::InsufficientCycles => INSUFFICIENT_CYCLES_MESSAGE,
            Self::Other => GENERIC_ERROR_MESSAGE,
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientCycles => write!(f, "insufficient_cycles"),
            Self::Other => write!(f, "other"),
        }
    }
}
