//! # BlockXpand Identity
//!
//! Obtains the identity a widget session calls the aggregator canister with.
//!
//! Two paths converge on the same [`Identity`]:
//!
//! - an injected [`WalletExtension`] that already holds a session, asked to
//!   whitelist the target canister;
//! - a URL-addressable identity provider behind an [`Authorizer`], driven by
//!   [`AuthClient`], whose completed sessions are kept in a [`SessionStore`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bx_identity::{AuthClient, FileSessionStore, IdentityAdapter, PemFileAuthorizer};
//!
//! # async fn example() -> bx_identity::Result<()> {
//! let store = Arc::new(FileSessionStore::in_config_dir()?);
//! let auth = AuthClient::create(Arc::new(PemFileAuthorizer::new()), store).await;
//! let mut adapter = IdentityAdapter::new(auth);
//!
//! let target = candid::Principal::from_text("ryjl3-tyaaa-aaaaa-aaaba-cai").unwrap();
//! let identity = adapter.login("file:///home/me/identity.pem", target).await?;
//! println!("logged in as {}", identity.principal_text());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod authorizer;
mod client;
mod error;
mod identity;
mod session;
mod store;
mod wallet;

pub use adapter::IdentityAdapter;
pub use authorizer::{Authorizer, PemFileAuthorizer};
pub use client::AuthClient;
pub use error::{AuthError, Result};
pub use identity::Identity;
pub use session::SessionState;
pub use store::{
    FileSessionStore, MemorySessionStore, SessionStore, StoredSession, DEFAULT_SESSION_TTL_SECS,
};
pub use wallet::WalletExtension;
