//! # Auth Client
//!
//! Redirect-style login against an [`Authorizer`], with the completed session
//! persisted in a [`SessionStore`].

use std::sync::Arc;

use chrono::Duration;

use crate::authorizer::Authorizer;
use crate::session::SessionState;
use crate::store::{SessionStore, StoredSession, DEFAULT_SESSION_TTL_SECS};
use crate::{AuthError, Identity, Result};

/// Login client for a URL-addressable identity provider.
pub struct AuthClient {
    authorizer: Arc<dyn Authorizer>,
    store: Arc<dyn SessionStore>,
    session_ttl: Duration,
    state: SessionState,
    identity: Option<Identity>,
}

impl AuthClient {
    /// Creates a client, restoring a stored session when possible.
    ///
    /// A stored session is only restored if it has not expired, the
    /// authorizer can rebuild it without interaction and the rebuilt
    /// principal matches the stored one. Anything else discards the record.
    pub async fn create(authorizer: Arc<dyn Authorizer>, store: Arc<dyn SessionStore>) -> Self {
        let mut client = Self {
            authorizer,
            store,
            session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
            state: SessionState::Anonymous,
            identity: None,
        };
        client.restore().await;
        client
    }

    /// Overrides the lifetime given to new sessions.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    async fn restore(&mut self) {
        let stored = match self.store.load() {
            Ok(Some(stored)) => stored,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load stored session");
                return;
            }
        };

        if stored.is_expired() {
            tracing::info!(principal = %stored.principal, "Stored session expired");
            self.discard_stored();
            return;
        }

        match self.authorizer.restore(&stored).await {
            Ok(identity) if identity.principal_text() == stored.principal => {
                tracing::info!(principal = %stored.principal, expires_at = %stored.expires_at, "Restored session");
                self.identity = Some(identity.with_expiry(stored.expires_at));
                self.state = SessionState::Authenticated;
            }
            Ok(identity) => {
                tracing::warn!(
                    stored = %stored.principal,
                    restored = %identity.principal(),
                    "Restored identity does not match stored session"
                );
                self.discard_stored();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not restore stored session");
                self.discard_stored();
            }
        }
    }

    fn discard_stored(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear stored session");
        }
    }

    /// Drops an identity whose session has run out, along with its stored
    /// record.
    fn expire_if_due(&mut self) {
        let Some(identity) = self.identity.as_ref().filter(|i| i.is_expired()) else {
            return;
        };
        tracing::info!(principal = %identity.principal(), "Session expired");
        self.identity = None;
        self.state = self.state.end();
        self.discard_stored();
    }

    fn live_identity(&self) -> Option<&Identity> {
        self.identity.as_ref().filter(|i| !i.is_expired())
    }

    /// Current login state. An expired session reads as
    /// [`SessionState::Anonymous`].
    #[must_use]
    pub fn state(&self) -> SessionState {
        match (self.state, self.live_identity()) {
            (SessionState::Authenticated, None) => SessionState::Anonymous,
            (state, _) => state,
        }
    }

    /// Returns true if an unexpired identity is available. No side effects.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated() && self.live_identity().is_some()
    }

    /// Runs the provider's login flow.
    ///
    /// An expired session is discarded first, so the provider is asked
    /// again. On failure the client is back in [`SessionState::Anonymous`]
    /// and can retry. Failing to persist the session is logged but does not
    /// fail the login.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, [`AuthError::Cancelled`] included.
    pub async fn login(&mut self, provider_url: &str) -> Result<Identity> {
        self.expire_if_due();
        if let (true, Some(identity)) = (self.state.is_authenticated(), &self.identity) {
            return Ok(identity.clone());
        }

        self.state = self.state.begin_login();
        tracing::info!(provider = %provider_url, "Starting login");

        match self.authorizer.authorize(provider_url).await {
            Ok(identity) => {
                self.state = self.state.finish_login(true);
                let stored =
                    StoredSession::new(provider_url, identity.principal_text(), self.session_ttl);
                let identity = identity.with_expiry(stored.expires_at);
                if let Err(e) = self.store.save(&stored) {
                    tracing::warn!(error = %e, "Failed to persist session");
                }
                tracing::info!(principal = %identity.principal(), expires_at = %stored.expires_at, "Login succeeded");
                self.identity = Some(identity.clone());
                Ok(identity)
            }
            Err(e) => {
                self.state = self.state.finish_login(false);
                tracing::info!(error = %e, "Login did not complete");
                Err(e)
            }
        }
    }

    /// Returns the logged-in identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] before a successful login and
    /// once the session has expired.
    pub fn get_identity(&self) -> Result<Identity> {
        match (self.live_identity(), self.state) {
            (Some(identity), SessionState::Authenticated) => Ok(identity.clone()),
            _ => Err(AuthError::NotAuthenticated),
        }
    }

    /// Forgets the identity and the stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored session cannot be removed; the
    /// in-memory identity is dropped regardless.
    pub fn logout(&mut self) -> Result<()> {
        self.identity = None;
        self.state = self.state.end();
        self.store.clear()
    }
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("state", &self.state)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
