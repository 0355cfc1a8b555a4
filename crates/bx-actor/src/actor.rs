//! # Actor
//!
//! A typed proxy for the aggregator canister, bound to one identity.

use std::sync::Arc;

use bx_identity::Identity;
use candid::Principal;

use crate::error::{ActorResult, CallError};
use crate::interface::{InterfaceDescriptor, Summary};
use crate::network::Network;
use crate::transport::{Connector, Transport};

/// Callable proxy for `get_holdings_summary`.
///
/// Cheap to clone; clones share the channel.
#[derive(Clone)]
pub struct ActorHandle {
    transport: Arc<dyn Transport>,
    descriptor: InterfaceDescriptor,
    caller: Principal,
}

/// Builds an actor signing as `identity`.
///
/// Off production the replica's root key is fetched first; on production the
/// agent's built-in key is used.
///
/// # Errors
///
/// Returns an error if the channel cannot be built or the root key cannot be
/// fetched.
pub async fn create_actor(
    connector: &dyn Connector,
    identity: &Identity,
    descriptor: InterfaceDescriptor,
    network: Network,
) -> ActorResult<ActorHandle> {
    let transport = connector.connect(identity)?;

    if network.requires_root_key() {
        tracing::debug!(%network, "Fetching replica root key");
        transport.fetch_root_key().await?;
    }

    tracing::info!(
        canister = %descriptor.canister_id(),
        principal = %identity.principal(),
        %network,
        "Created actor"
    );

    Ok(ActorHandle {
        transport,
        descriptor,
        caller: identity.principal(),
    })
}

impl ActorHandle {
    /// The principal requests are signed as.
    #[must_use]
    pub fn caller(&self) -> Principal {
        self.caller
    }

    /// The interface this actor calls.
    #[must_use]
    pub fn descriptor(&self) -> &InterfaceDescriptor {
        &self.descriptor
    }

    /// Fetches the holdings summary of `principal`.
    ///
    /// One round trip, no retry.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Remote`] when the canister answers `Err`, and
    /// [`CallError::Transport`] when no well-formed reply arrives.
    pub async fn call(&self, principal: Principal) -> Result<Summary, CallError> {
        let method = self.descriptor.method();
        let canister = self.descriptor.canister_id();
        tracing::debug!(%canister, %principal, method, "Calling canister");

        let reply = match self.round_trip(principal).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(%canister, %principal, error = %e, "Transport failure");
                return Err(CallError::Transport(e));
            }
        };

        match reply {
            Ok(entries) => {
                tracing::debug!(%principal, entries = entries.len(), "Received summary");
                Ok(Summary::new(entries))
            }
            Err(message) => {
                tracing::info!(%principal, error = %message, "Canister returned an error");
                Err(CallError::Remote(message))
            }
        }
    }

    async fn round_trip(&self, principal: Principal) -> ActorResult<crate::HoldingsReply> {
        let arg = self.descriptor.encode_args(principal)?;
        let bytes = self
            .transport
            .update(&self.descriptor.canister_id(), self.descriptor.method(), arg)
            .await?;
        self.descriptor.decode_reply(&bytes)
    }
}

impl std::fmt::Debug for ActorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorHandle")
            .field("canister", &self.descriptor.canister_id().to_text())
            .field("caller", &self.caller.to_text())
            .finish_non_exhaustive()
    }
}
