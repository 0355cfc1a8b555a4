//! # Identity Provider Adapter
//!
//! Produces an [`Identity`] from whichever source is present: an injected
//! wallet extension, or the redirect-style [`AuthClient`].

use std::sync::Arc;

use candid::Principal;

use crate::client::AuthClient;
use crate::session::SessionState;
use crate::wallet::WalletExtension;
use crate::{AuthError, Identity, Result};

/// Single entry point for logging in, whichever path is taken.
pub struct IdentityAdapter {
    auth: AuthClient,
    wallet: Option<Arc<dyn WalletExtension>>,
    wallet_identity: Option<Identity>,
    state: SessionState,
}

impl IdentityAdapter {
    /// Creates an adapter over the redirect-style client.
    ///
    /// A session the client restored counts as already authenticated.
    #[must_use]
    pub fn new(auth: AuthClient) -> Self {
        Self {
            auth,
            wallet: None,
            wallet_identity: None,
            state: SessionState::Anonymous,
        }
    }

    /// Attaches the wallet the host detected, if any.
    #[must_use]
    pub fn with_wallet(mut self, wallet: Option<Arc<dyn WalletExtension>>) -> Self {
        self.wallet = wallet;
        self
    }

    /// The wallet to use, if one is injected and available.
    fn available_wallet(&self) -> Option<Arc<dyn WalletExtension>> {
        self.wallet.as_ref().filter(|w| w.is_available()).cloned()
    }

    /// Current login state.
    ///
    /// Without a wallet session this is the provider client's state, so an
    /// expired provider session reads as anonymous.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.wallet_identity.is_some() {
            self.state
        } else {
            self.auth.state()
        }
    }

    /// Returns true if an identity is available. No side effects.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        match self.wallet_identity {
            Some(_) => self.state.is_authenticated(),
            None => self.auth.is_authenticated(),
        }
    }

    /// Logs in, through the wallet when one is available.
    ///
    /// The wallet path asks for a connection whitelisting `target_service`
    /// and takes the identity from the wallet session; the provider at
    /// `provider_url` is not contacted. Either way the adapter ends
    /// [`SessionState::Authenticated`] on success and
    /// [`SessionState::Anonymous`] on failure.
    ///
    /// # Errors
    ///
    /// Returns the provider's or wallet's error. A declined wallet
    /// connection is [`AuthError::Cancelled`].
    pub async fn login(&mut self, provider_url: &str, target_service: Principal) -> Result<Identity> {
        if self.is_authenticated() {
            return self.get_identity();
        }

        match self.available_wallet() {
            Some(wallet) => {
                self.state = self.state.begin_login();
                let result = self.login_with_wallet(wallet.as_ref(), target_service).await;
                self.state = self.state.finish_login(result.is_ok());
                result
            }
            None => self.auth.login(provider_url).await,
        }
    }

    async fn login_with_wallet(
        &mut self,
        wallet: &dyn WalletExtension,
        target_service: Principal,
    ) -> Result<Identity> {
        tracing::info!(wallet = %wallet.name(), target = %target_service, "Requesting wallet connection");

        if !wallet.request_connect(&[target_service]).await? {
            tracing::info!(wallet = %wallet.name(), "Wallet connection declined");
            return Err(AuthError::Cancelled);
        }

        let identity = wallet.session_identity().await?;
        tracing::info!(wallet = %wallet.name(), principal = %identity.principal(), "Wallet connected");
        self.wallet_identity = Some(identity.clone());
        Ok(identity)
    }

    /// Returns the logged-in identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] before a successful login.
    pub fn get_identity(&self) -> Result<Identity> {
        match &self.wallet_identity {
            Some(identity) if self.state.is_authenticated() => Ok(identity.clone()),
            Some(_) => Err(AuthError::NotAuthenticated),
            None => self.auth.get_identity(),
        }
    }

    /// Forgets the current identity on both paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored session cannot be removed.
    pub fn logout(&mut self) -> Result<()> {
        self.wallet_identity = None;
        self.state = self.state.end();
        self.auth.logout()
    }
}
