//! # BlockXpand Actor
//!
//! Typed client for the aggregator canister's `get_holdings_summary` method.
//!
//! An [`ActorHandle`] is bound to one identity. It is built by
//! [`create_actor`] from a [`Connector`], which opens an authenticated
//! [`Transport`] to a replica. [`AgentConnector`] does this with `ic-agent`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bx_actor::{create_actor, AgentConnector, InterfaceDescriptor, Network};
//! use bx_identity::Identity;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let identity = Identity::anonymous();
//! let connector = AgentConnector::new(Network::Local.default_url())?;
//! let descriptor = InterfaceDescriptor::from_text("ryjl3-tyaaa-aaaaa-aaaba-cai")?;
//!
//! let actor = create_actor(&connector, &identity, descriptor, Network::Local).await?;
//! let summary = actor.call(identity.principal()).await?;
//! println!("total: {}", summary.grand_total());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod actor;
mod error;
mod interface;
mod network;
mod transport;

pub use actor::{create_actor, ActorHandle};
pub use error::{ActorError, ActorResult, CallError};
pub use interface::{
    HoldingsReply, InterfaceDescriptor, Summary, TokenTotal, CANISTER_ID_PLACEHOLDER,
    GET_HOLDINGS_SUMMARY,
};
pub use network::Network;
pub use transport::{AgentConnector, AgentTransport, Connector, Transport};
