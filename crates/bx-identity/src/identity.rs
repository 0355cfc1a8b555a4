//! The credential a session holds after login.

use std::fmt;
use std::sync::Arc;

use candid::Principal;
use chrono::{DateTime, Utc};
use ic_agent::identity::AnonymousIdentity;

use crate::{AuthError, Result};

/// An authenticated identity: a request signer plus the principal it acts as.
///
/// Cloning is cheap; the signer is shared. Identities issued by a provider
/// session carry that session's expiry; wallet and anonymous identities do
/// not expire.
#[derive(Clone)]
pub struct Identity {
    principal: Principal,
    signer: Arc<dyn ic_agent::Identity>,
    expires_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Wraps a signer, deriving the principal from it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredential`] if the signer cannot report
    /// its sender principal.
    pub fn from_signer(signer: Arc<dyn ic_agent::Identity>) -> Result<Self> {
        let principal = signer.sender().map_err(AuthError::InvalidCredential)?;
        Ok(Self {
            principal,
            signer,
            expires_at: None,
        })
    }

    /// Builds an identity whose principal was reported by a wallet session.
    ///
    /// Wallets own their keys, so the principal is taken as given rather than
    /// derived from `signer`.
    #[must_use]
    pub fn delegated(principal: Principal, signer: Arc<dyn ic_agent::Identity>) -> Self {
        Self {
            principal,
            signer,
            expires_at: None,
        }
    }

    /// The anonymous identity, used for read-only lookups of other principals.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            principal: Principal::anonymous(),
            signer: Arc::new(AnonymousIdentity),
            expires_at: None,
        }
    }

    /// Bounds the identity to a session ending at `expires_at`.
    #[must_use]
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// When the identity stops being usable, if ever.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns true if the identity has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// Returns true if the identity has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// The principal this identity acts as.
    #[must_use]
    pub fn principal(&self) -> Principal {
        self.principal
    }

    /// Textual form of the principal.
    #[must_use]
    pub fn principal_text(&self) -> String {
        self.principal.to_text()
    }

    /// The signer used to authenticate requests.
    #[must_use]
    pub fn signer(&self) -> Arc<dyn ic_agent::Identity> {
        Arc::clone(&self.signer)
    }

    /// Returns true for the anonymous principal.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.principal == Principal::anonymous()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("principal", &self.principal.to_text())
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
