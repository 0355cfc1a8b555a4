//! # BlockXpand Summary Widget
//!
//! Connects a user, fetches their holdings summary from the aggregator
//! canister and renders the grand total on a [`SummaryView`].
//!
//! The [`SummaryController`] owns the session (identity plus actor) and
//! replaces it wholesale on every connect. Failures at the login and fetch
//! boundaries become view state: login failures are logged, fetch failures
//! are classified into a short message shown through an [`ErrorNotice`] that
//! clears itself.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bx_widget::{SummaryController, TerminalView, WidgetConfig};
//!
//! # async fn example() -> bx_widget::Result<()> {
//! let config = WidgetConfig::load(None)?;
//! let view = Arc::new(TerminalView::new());
//! let controller = SummaryController::from_config(&config, view, None).await?;
//!
//! controller.on_connect_clicked().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod classify;
mod config;
mod controller;
mod error;
mod format;
mod logging;
mod notice;
mod view;

pub use classify::{ErrorClass, GENERIC_ERROR_MESSAGE, INSUFFICIENT_CYCLES_MESSAGE};
pub use crate::config::{WidgetConfig, ENV_PREFIX};
pub use controller::{
    ConnectOutcome, ControllerOptions, FetchOutcome, Session, SummaryController, ViewState,
};
pub use error::{Result, WidgetError};
pub use format::{round_total, TotalFormat, DEFAULT_TOTAL_LABEL, DEFAULT_UNIT_LABEL, DISPLAY_DECIMALS};
pub use logging::{default_directive, init_logging, level_for_verbosity, LogFormat};
pub use notice::{ErrorNotice, DEFAULT_ERROR_CLEAR_DELAY};
pub use view::{SummaryView, TerminalView};
