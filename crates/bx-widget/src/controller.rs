//! # Summary Controller
//!
//! Drives the view through one connect, fetch and render cycle:
//!
//! ```text
//! Idle -> Loading -> Populated
//!                 -> Failed
//! ```
//!
//! `Populated` and `Failed` return to `Idle` on the next connect. Nothing is
//! retried automatically.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bx_actor::{create_actor, ActorHandle, AgentConnector, Connector, InterfaceDescriptor, Network};
use bx_identity::{
    AuthClient, AuthError, FileSessionStore, Identity, IdentityAdapter, PemFileAuthorizer,
    SessionStore, WalletExtension,
};
use candid::Principal;
use parking_lot::{Mutex, RwLock};

use crate::classify::ErrorClass;
use crate::config::WidgetConfig;
use crate::format::TotalFormat;
use crate::notice::ErrorNotice;
use crate::view::SummaryView;
use crate::{Result, WidgetError};

/// Display state of the widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewState {
    /// Nothing requested yet, or reset by a new connect.
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// A total is on display.
    Populated,
    /// The last fetch failed.
    Failed,
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Populated => write!(f, "populated"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// How one fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The total was rendered with this text.
    Populated(String),
    /// A classified error was shown.
    Failed(ErrorClass),
    /// A newer fetch was issued meanwhile; nothing was rendered.
    Discarded,
}

/// How a connect click ended.
#[derive(Debug)]
pub enum ConnectOutcome {
    /// Login failed or was cancelled; the widget is back where it started.
    LoginFailed(AuthError),
    /// A fetch ran.
    Fetched(FetchOutcome),
}

/// An identity with the actor built for it.
#[derive(Debug)]
pub struct Session {
    identity: Identity,
    actor: ActorHandle,
}

impl Session {
    /// The session identity.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The principal summaries are fetched for.
    #[must_use]
    pub fn principal(&self) -> Principal {
        self.identity.principal()
    }
}

/// Per-deployment settings of the controller.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Aggregator interface.
    pub descriptor: InterfaceDescriptor,
    /// Network, which decides the root-key fetch.
    pub network: Network,
    /// Identity provider URL used by login.
    pub provider_url: String,
    /// Time an error stays on display.
    pub error_clear_delay: Duration,
    /// Total display format.
    pub format: TotalFormat,
}

impl ControllerOptions {
    /// Options with default delay and format.
    pub fn new(
        descriptor: InterfaceDescriptor,
        network: Network,
        provider_url: impl Into<String>,
    ) -> Self {
        Self {
            descriptor,
            network,
            provider_url: provider_url.into(),
            error_clear_delay: crate::notice::DEFAULT_ERROR_CLEAR_DELAY,
            format: TotalFormat::default(),
        }
    }

    /// Options from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Config`] if the canister id or identity
    /// provider is missing.
    pub fn from_config(config: &WidgetConfig) -> Result<Self> {
        Ok(Self {
            descriptor: config.descriptor()?,
            network: config.network,
            provider_url: config.identity_provider()?,
            error_clear_delay: config.error_clear_delay(),
            format: config.total_format(),
        })
    }
}

/// Re-enables the connect trigger when dropped.
struct TriggerGuard<'a>(&'a dyn SummaryView);

impl Drop for TriggerGuard<'_> {
    fn drop(&mut self) {
        self.0.set_connect_enabled(true);
    }
}

/// Hides the loading indicator when dropped.
struct LoadingGuard<'a>(&'a dyn SummaryView);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.hide_loading();
    }
}

/// The widget's controller.
pub struct SummaryController {
    adapter: tokio::sync::Mutex<IdentityAdapter>,
    connector: Arc<dyn Connector>,
    view: Arc<dyn SummaryView>,
    notice: ErrorNotice,
    options: ControllerOptions,
    session: RwLock<Option<Arc<Session>>>,
    generation: AtomicU64,
    state: Mutex<ViewState>,
}

impl SummaryController {
    /// Creates a controller.
    pub fn new(
        adapter: IdentityAdapter,
        connector: Arc<dyn Connector>,
        view: Arc<dyn SummaryView>,
        options: ControllerOptions,
    ) -> Self {
        let notice = ErrorNotice::new(Arc::clone(&view), options.error_clear_delay);
        Self {
            adapter: tokio::sync::Mutex::new(adapter),
            connector,
            view,
            notice,
            options,
            session: RwLock::new(None),
            generation: AtomicU64::new(0),
            state: Mutex::new(ViewState::Idle),
        }
    }

    /// Wires a controller from configuration: PEM file provider, file
    /// session store and an `ic-agent` connector.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is incomplete or the session
    /// store or replica URL is unusable.
    pub async fn from_config(
        config: &WidgetConfig,
        view: Arc<dyn SummaryView>,
        wallet: Option<Arc<dyn WalletExtension>>,
    ) -> Result<Self> {
        let options = ControllerOptions::from_config(config)?;
        let store: Arc<dyn SessionStore> = match &config.session_file {
            Some(path) => Arc::new(FileSessionStore::new(path)),
            None => Arc::new(FileSessionStore::in_config_dir()?),
        };

        let auth = AuthClient::create(Arc::new(PemFileAuthorizer::new()), store)
            .await
            .with_session_ttl(config.session_ttl());
        let adapter = IdentityAdapter::new(auth).with_wallet(wallet);
        let connector = Arc::new(AgentConnector::new(config.replica_url())?);

        Ok(Self::new(adapter, connector, view, options))
    }

    /// Current display state.
    #[must_use]
    pub fn state(&self) -> ViewState {
        *self.state.lock()
    }

    /// The current session, if connected.
    #[must_use]
    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.read().clone()
    }

    /// Returns true if an unexpired session is established.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session
            .read()
            .as_ref()
            .is_some_and(|s| !s.identity.is_expired())
    }

    /// The session, unless its identity has expired. An expired session is
    /// dropped and in-flight responses for it are discarded.
    fn live_session(&self) -> Option<Arc<Session>> {
        let session = self.session()?;
        if !session.identity.is_expired() {
            return Some(session);
        }

        let mut current = self.session.write();
        if current.as_ref().is_some_and(|s| Arc::ptr_eq(s, &session)) {
            *current = None;
            self.generation.fetch_add(1, Ordering::SeqCst);
            tracing::info!(principal = %session.principal(), "Session expired");
        }
        None
    }

    fn set_state(&self, state: ViewState) {
        let mut current = self.state.lock();
        if *current != state {
            tracing::debug!(from = %*current, to = %state, "View state");
            *current = state;
        }
    }

    /// Handles a click on the connect trigger.
    ///
    /// The trigger is disabled for the duration and re-enabled on every exit
    /// path. With a session in place this goes straight to the fetch;
    /// otherwise the adapter logs in first. Login failures are logged and
    /// leave the widget as it was.
    ///
    /// # Errors
    ///
    /// Only misuse errors from [`Self::fetch_and_render`] are returned.
    pub async fn on_connect_clicked(&self) -> Result<ConnectOutcome> {
        self.view.set_connect_enabled(false);
        let _trigger = TriggerGuard(self.view.as_ref());

        if matches!(self.state(), ViewState::Populated | ViewState::Failed) {
            self.set_state(ViewState::Idle);
        }

        if self.live_session().is_some() {
            return self.fetch_and_render().await.map(ConnectOutcome::Fetched);
        }

        let login = {
            let mut adapter = self.adapter.lock().await;
            adapter
                .login(&self.options.provider_url, self.options.descriptor.canister_id())
                .await
        };

        match login {
            Ok(identity) => self
                .on_authenticated(identity)
                .await
                .map(ConnectOutcome::Fetched),
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                Ok(ConnectOutcome::LoginFailed(e))
            }
        }
    }

    /// Builds the actor for `identity`, replaces the session and fetches.
    ///
    /// An actor that cannot be built is a transport failure and is shown as
    /// a classified error.
    ///
    /// # Errors
    ///
    /// Only misuse errors from [`Self::fetch_and_render`] are returned.
    pub async fn on_authenticated(&self, identity: Identity) -> Result<FetchOutcome> {
        tracing::info!(principal = %identity.principal(), "Authenticated");

        let actor = match create_actor(
            self.connector.as_ref(),
            &identity,
            self.options.descriptor,
            self.options.network,
        )
        .await
        {
            Ok(actor) => actor,
            Err(e) => {
                tracing::warn!(principal = %identity.principal(), error = %e, "Failed to create actor");
                return Ok(FetchOutcome::Failed(self.fail(&e.to_string())));
            }
        };

        *self.session.write() = Some(Arc::new(Session { identity, actor }));
        self.fetch_and_render().await
    }

    /// Fetches the summary for the session principal and renders it.
    ///
    /// The loading indicator is hidden exactly once per call. If a newer
    /// fetch was issued while this one was in flight, the response is
    /// dropped. A dropped response still hides the indicator, which can
    /// happen while the newer fetch is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::NotAuthenticated`] without any network call
    /// when there is no session or its identity has expired.
    pub async fn fetch_and_render(&self) -> Result<FetchOutcome> {
        let session = self.live_session().ok_or(WidgetError::NotAuthenticated)?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        self.set_state(ViewState::Loading);
        self.view.show_loading();
        let _loading = LoadingGuard(self.view.as_ref());

        let result = session.actor.call(session.principal()).await;

        let latest = self.generation.load(Ordering::SeqCst);
        if generation != latest {
            tracing::debug!(generation, latest, "Discarding stale response");
            return Ok(FetchOutcome::Discarded);
        }

        match result {
            Ok(summary) => {
                let text = self.options.format.render(summary.grand_total());
                tracing::info!(principal = %session.principal(), entries = summary.len(), "Rendered total");
                self.view.show_total(&text);
                self.set_state(ViewState::Populated);
                Ok(FetchOutcome::Populated(text))
            }
            Err(e) => {
                tracing::debug!(kind = e.kind(), "Fetch failed");
                Ok(FetchOutcome::Failed(self.fail(&e.message())))
            }
        }
    }

    fn fail(&self, message: &str) -> ErrorClass {
        let class = ErrorClass::classify(message);
        self.notice.show(class.user_message());
        self.set_state(ViewState::Failed);
        class
    }

    /// Ends the session and forgets the stored login.
    ///
    /// Responses still in flight are discarded. The session is dropped even
    /// when the stored login cannot be removed.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::Auth`] if the stored session cannot be removed.
    pub async fn logout(&self) -> Result<()> {
        *self.session.write() = None;
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.set_state(ViewState::Idle);

        if let Err(e) = self.adapter.lock().await.logout() {
            tracing::warn!(error = %e, "Failed to clear stored session");
            return Err(e.into());
        }
        tracing::info!("Logged out");
        Ok(())
    }
}

impl fmt::Debug for SummaryController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryController")
            .field("state", &self.state())
            .field("options", &self.options)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
