//! Request channels to a replica.

use std::sync::Arc;

use async_trait::async_trait;
use bx_identity::Identity;
use candid::Principal;
use ic_agent::Agent;

use crate::error::{ActorError, ActorResult};

/// An authenticated request channel.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches and trusts the replica's root key.
    async fn fetch_root_key(&self) -> ActorResult<()>;

    /// Issues an update call and waits for its reply bytes.
    async fn update(&self, canister_id: &Principal, method: &str, arg: Vec<u8>)
        -> ActorResult<Vec<u8>>;
}

/// Builds a [`Transport`] that signs as a given identity.
pub trait Connector: Send + Sync {
    /// Opens a channel for `identity`.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel cannot be configured.
    fn connect(&self, identity: &Identity) -> ActorResult<Arc<dyn Transport>>;
}

/// [`Transport`] over an `ic-agent` [`Agent`].
pub struct AgentTransport {
    agent: Agent,
}

impl AgentTransport {
    /// Wraps a configured agent.
    #[must_use]
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Transport for AgentTransport {
    async fn fetch_root_key(&self) -> ActorResult<()> {
        self.agent.fetch_root_key().await?;
        Ok(())
    }

    async fn update(
        &self,
        canister_id: &Principal,
        method: &str,
        arg: Vec<u8>,
    ) -> ActorResult<Vec<u8>> {
        let reply = self
            .agent
            .update(canister_id, method)
            .with_arg(arg)
            .call_and_wait()
            .await?;
        Ok(reply)
    }
}

/// [`Connector`] producing [`AgentTransport`]s for one replica URL.
#[derive(Debug, Clone)]
pub struct AgentConnector {
    url: String,
}

impl AgentConnector {
    /// Connector for the replica at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::InvalidUrl`] unless `url` is an `http` or
    /// `https` URL.
    pub fn new(url: impl Into<String>) -> ActorResult<Self> {
        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ActorError::InvalidUrl(url));
        }
        Ok(Self { url })
    }

    /// The replica URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for AgentConnector {
    fn connect(&self, identity: &Identity) -> ActorResult<Arc<dyn Transport>> {
        let agent = Agent::builder()
            .with_url(self.url.clone())
            .with_arc_identity(identity.signer())
            .build()?;
        tracing::debug!(url = %self.url, principal = %identity.principal(), "Built agent");
        Ok(Arc::new(AgentTransport::new(agent)))
    }
}
