//! Extension-style wallets that hold their own session.

use async_trait::async_trait;
use candid::Principal;

use crate::{Identity, Result};

/// A wallet injected by the host environment.
///
/// Presence is optional: hosts pass `None` when nothing was injected, and an
/// injected wallet may still report itself unavailable (locked, disabled).
#[async_trait]
pub trait WalletExtension: Send + Sync {
    /// Human-readable wallet name, for logs.
    fn name(&self) -> &str;

    /// Returns true if the wallet can be asked to connect.
    fn is_available(&self) -> bool {
        true
    }

    /// Asks the user to allow calls to the whitelisted canisters.
    ///
    /// Returns `Ok(false)` when the user declines.
    async fn request_connect(&self, whitelist: &[Principal]) -> Result<bool>;

    /// The identity of the wallet's current session.
    async fn session_identity(&self) -> Result<Identity>;
}
