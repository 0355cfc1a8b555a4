//! # Aggregator Interface
//!
//! The Candid contract of the aggregator canister's summary endpoint and its
//! Rust bindings. The canister id is the only per-deployment value.

use std::str::FromStr;

use candid::{CandidType, Deserialize, Principal};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{ActorError, ActorResult};

/// Name of the single remote method.
pub const GET_HOLDINGS_SUMMARY: &str = "get_holdings_summary";

/// Placeholder replaced by the canister id when the interface is rendered.
pub const CANISTER_ID_PLACEHOLDER: &str = "<CANISTER_ID>";

const CANDID_TEMPLATE: &str = "\
// canister: <CANISTER_ID>
type TokenTotal = record { token : text; total : float64 };
service : {
  get_holdings_summary : (principal) -> (variant { Ok : vec TokenTotal; Err : text });
}
";

/// One balance line.
#[derive(CandidType, Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TokenTotal {
    /// Token symbol.
    pub token: String,
    /// Balance in whole tokens.
    pub total: f64,
}

impl TokenTotal {
    /// Creates a balance line.
    pub fn new(token: impl Into<String>, total: f64) -> Self {
        Self {
            token: token.into(),
            total,
        }
    }
}

/// Wire reply of `get_holdings_summary`: `variant { Ok : vec TokenTotal; Err : text }`.
pub type HoldingsReply = Result<Vec<TokenTotal>, String>;

/// Ordered balance lines returned for one principal.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Summary {
    entries: Vec<TokenTotal>,
}

impl Summary {
    /// Wraps received lines, keeping their order.
    #[must_use]
    pub fn new(entries: Vec<TokenTotal>) -> Self {
        Self { entries }
    }

    /// The balance lines.
    #[must_use]
    pub fn entries(&self) -> &[TokenTotal] {
        &self.entries
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no lines were returned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every line's total.
    ///
    /// Each total enters the sum through its shortest decimal form, so
    /// `0.1 + 0.2` is exactly `0.3` and the result does not depend on order.
    /// Totals that are not finite or do not fit a [`Decimal`] are skipped.
    #[must_use]
    pub fn grand_total(&self) -> Decimal {
        let mut sum = Decimal::ZERO;
        for entry in &self.entries {
            let Some(value) = to_decimal(entry.total) else {
                tracing::warn!(token = %entry.token, total = entry.total, "Skipping unrepresentable total");
                continue;
            };
            match sum.checked_add(value) {
                Some(next) => sum = next,
                None => {
                    tracing::warn!(token = %entry.token, total = entry.total, "Skipping total that overflows the sum");
                }
            }
        }
        sum
    }
}

impl From<Vec<TokenTotal>> for Summary {
    fn from(entries: Vec<TokenTotal>) -> Self {
        Self::new(entries)
    }
}

fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
}

/// Static description of the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    canister_id: Principal,
}

impl InterfaceDescriptor {
    /// Descriptor for the aggregator deployed at `canister_id`.
    #[must_use]
    pub fn aggregator(canister_id: Principal) -> Self {
        Self { canister_id }
    }

    /// Parses the canister id from text.
    ///
    /// # Errors
    ///
    /// Returns the principal parse error text if `canister_id` is malformed.
    pub fn from_text(canister_id: &str) -> Result<Self, String> {
        Principal::from_text(canister_id)
            .map(Self::aggregator)
            .map_err(|e| format!("invalid canister id {canister_id:?}: {e}"))
    }

    /// The canister the descriptor addresses.
    #[must_use]
    pub fn canister_id(&self) -> Principal {
        self.canister_id
    }

    /// The method called by [`crate::ActorHandle::call`].
    #[must_use]
    pub fn method(&self) -> &'static str {
        GET_HOLDINGS_SUMMARY
    }

    /// Candid source with the canister id substituted.
    #[must_use]
    pub fn candid_source(&self) -> String {
        CANDID_TEMPLATE.replace(CANISTER_ID_PLACEHOLDER, &self.canister_id.to_text())
    }

    /// Encodes the argument tuple `(principal)`.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::Encode`] if Candid serialization fails.
    pub fn encode_args(&self, principal: Principal) -> ActorResult<Vec<u8>> {
        candid::encode_one(principal).map_err(ActorError::Encode)
    }

    /// Decodes the reply variant.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::Decode`] if the bytes do not hold a
    /// [`HoldingsReply`].
    pub fn decode_reply(&self, bytes: &[u8]) -> ActorResult<HoldingsReply> {
        candid::decode_one(bytes).map_err(ActorError::Decode)
    }
}
