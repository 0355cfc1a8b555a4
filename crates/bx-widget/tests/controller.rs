//! Controller behavior against an in-process identity provider and canister.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bx_actor::{ActorError, ActorResult, Connector, InterfaceDescriptor, Network, Transport};
use bx_identity::{
    AuthClient, AuthError, Authorizer, Identity, IdentityAdapter, MemorySessionStore,
    SessionStore, StoredSession, WalletExtension,
};
use bx_widget::{
    ConnectOutcome, ControllerOptions, ErrorClass, FetchOutcome, SummaryController, SummaryView,
    ViewState, WidgetError, GENERIC_ERROR_MESSAGE, INSUFFICIENT_CYCLES_MESSAGE,
};
use candid::{CandidType, Principal};
use ic_agent::identity::AnonymousIdentity;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tokio::sync::oneshot;

const CANISTER: &str = "ryjl3-tyaaa-aaaaa-aaaba-cai";
const PROVIDER: &str = "file:///keys/alice.pem";

// ----------------------------------------------------------------------------
// View
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Connect(bool),
    ShowLoading,
    HideLoading,
    Total(String),
    Error(String),
    ClearError,
}

#[derive(Default)]
struct RecordingView {
    events: Mutex<Vec<Event>>,
    error: Mutex<Option<String>>,
}

impl RecordingView {
    fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    fn count(&self, event: &Event) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    fn error(&self) -> Option<String> {
        self.error.lock().clone()
    }

    fn totals(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Total(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }
}

impl SummaryView for RecordingView {
    fn set_connect_enabled(&self, enabled: bool) {
        self.events.lock().push(Event::Connect(enabled));
    }

    fn show_loading(&self) {
        self.events.lock().push(Event::ShowLoading);
    }

    fn hide_loading(&self) {
        self.events.lock().push(Event::HideLoading);
    }

    fn show_total(&self, text: &str) {
        self.events.lock().push(Event::Total(text.to_string()));
    }

    fn show_error(&self, message: &str) {
        *self.error.lock() = Some(message.to_string());
        self.events.lock().push(Event::Error(message.to_string()));
    }

    fn clear_error(&self) {
        *self.error.lock() = None;
        self.events.lock().push(Event::ClearError);
    }
}

// ----------------------------------------------------------------------------
// Canister
// ----------------------------------------------------------------------------

#[derive(CandidType)]
struct HoldingSummary {
    token: String,
    total: f64,
}

#[derive(CandidType)]
enum CanisterReply {
    Ok(Vec<HoldingSummary>),
    Err(String),
}

enum Reply {
    Holdings(Vec<(&'static str, f64)>),
    Reject(&'static str),
    Unreachable(&'static str),
}

struct Scripted {
    reply: Reply,
    gate: Option<oneshot::Receiver<()>>,
}

#[derive(Default)]
struct FakeCanister {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Principal>>,
    root_key_fetches: AtomicUsize,
    root_key_fails: bool,
}

impl FakeCanister {
    fn replying(replies: Vec<Reply>) -> Arc<Self> {
        let canister = Self::default();
        for reply in replies {
            canister.script.lock().push_back(Scripted { reply, gate: None });
        }
        Arc::new(canister)
    }

    fn without_root_key() -> Arc<Self> {
        Arc::new(Self {
            root_key_fails: true,
            ..Self::default()
        })
    }

    /// Queues a reply that is held until the returned sender fires.
    fn push_gated(&self, reply: Reply) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.script.lock().push_back(Scripted {
            reply,
            gate: Some(rx),
        });
        tx
    }

    fn push(&self, reply: Reply) {
        self.script.lock().push_back(Scripted { reply, gate: None });
    }

    fn calls(&self) -> Vec<Principal> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Transport for FakeCanister {
    async fn fetch_root_key(&self) -> ActorResult<()> {
        self.root_key_fetches.fetch_add(1, Ordering::SeqCst);
        if self.root_key_fails {
            return Err(ActorError::Transport("connection refused".into()));
        }
        Ok(())
    }

    async fn update(
        &self,
        _canister_id: &Principal,
        _method: &str,
        arg: Vec<u8>,
    ) -> ActorResult<Vec<u8>> {
        let principal: Principal = candid::decode_one(&arg).map_err(ActorError::Decode)?;
        self.calls.lock().push(principal);

        let scripted = self
            .script
            .lock()
            .pop_front()
            .expect("unexpected canister call");
        if let Some(gate) = scripted.gate {
            let _ = gate.await;
        }

        let reply = match scripted.reply {
            Reply::Holdings(lines) => CanisterReply::Ok(
                lines
                    .into_iter()
                    .map(|(token, total)| HoldingSummary {
                        token: token.to_string(),
                        total,
                    })
                    .collect(),
            ),
            Reply::Reject(message) => CanisterReply::Err(message.to_string()),
            Reply::Unreachable(message) => return Err(ActorError::Transport(message.into())),
        };
        Ok(candid::encode_one(reply).expect("encode reply"))
    }
}

struct FakeConnector {
    canister: Arc<FakeCanister>,
    identities: Mutex<Vec<Principal>>,
}

impl Connector for FakeConnector {
    fn connect(&self, identity: &Identity) -> ActorResult<Arc<dyn Transport>> {
        self.identities.lock().push(identity.principal());
        Ok(self.canister.clone())
    }
}

// ----------------------------------------------------------------------------
// Identity
// ----------------------------------------------------------------------------

struct FakeProvider {
    principal: Principal,
    succeed: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl Authorizer for FakeProvider {
    async fn authorize(&self, provider_url: &str) -> bx_identity::Result<Identity> {
        assert_eq!(provider_url, PROVIDER);
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.succeed {
            Ok(Identity::delegated(self.principal, Arc::new(AnonymousIdentity)))
        } else {
            Err(AuthError::Cancelled)
        }
    }
}

struct FakeWallet {
    principal: Principal,
    whitelists: Mutex<Vec<Vec<Principal>>>,
}

#[async_trait]
impl WalletExtension for FakeWallet {
    fn name(&self) -> &str {
        "fake-wallet"
    }

    async fn request_connect(&self, whitelist: &[Principal]) -> bx_identity::Result<bool> {
        self.whitelists.lock().push(whitelist.to_vec());
        Ok(true)
    }

    async fn session_identity(&self) -> bx_identity::Result<Identity> {
        Ok(Identity::delegated(self.principal, Arc::new(AnonymousIdentity)))
    }
}

fn alice() -> Principal {
    Principal::self_authenticating(b"alice")
}

fn canister_id() -> Principal {
    Principal::from_text(CANISTER).unwrap()
}

// ----------------------------------------------------------------------------
// Harness
// ----------------------------------------------------------------------------

struct Harness {
    controller: Arc<SummaryController>,
    view: Arc<RecordingView>,
    canister: Arc<FakeCanister>,
    connector: Arc<FakeConnector>,
    provider: Arc<FakeProvider>,
}

struct Setup {
    canister: Arc<FakeCanister>,
    login_succeeds: bool,
    network: Network,
    wallet: Option<Arc<FakeWallet>>,
    store: Option<Arc<dyn SessionStore>>,
    session_ttl: Option<chrono::Duration>,
}

impl Setup {
    fn new(canister: Arc<FakeCanister>) -> Self {
        Self {
            canister,
            login_succeeds: true,
            network: Network::Local,
            wallet: None,
            store: None,
            session_ttl: None,
        }
    }

    async fn build(self) -> Harness {
        let provider = Arc::new(FakeProvider {
            principal: alice(),
            succeed: self.login_succeeds,
            calls: AtomicUsize::new(0),
        });
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemorySessionStore::new()));
        let mut auth = AuthClient::create(provider.clone(), store).await;
        if let Some(ttl) = self.session_ttl {
            auth = auth.with_session_ttl(ttl);
        }
        let wallet = self.wallet.map(|w| w as Arc<dyn WalletExtension>);
        let adapter = IdentityAdapter::new(auth).with_wallet(wallet);

        let connector = Arc::new(FakeConnector {
            canister: self.canister.clone(),
            identities: Mutex::new(Vec::new()),
        });
        let view = Arc::new(RecordingView::default());
        let options = ControllerOptions::new(
            InterfaceDescriptor::aggregator(canister_id()),
            self.network,
            PROVIDER,
        );

        let controller = Arc::new(SummaryController::new(
            adapter,
            connector.clone(),
            view.clone(),
            options,
        ));

        Harness {
            controller,
            view,
            canister: self.canister,
            connector,
            provider,
        }
    }
}

async fn harness(replies: Vec<Reply>) -> Harness {
    Setup::new(FakeCanister::replying(replies)).build().await
}

fn fetched(outcome: ConnectOutcome) -> FetchOutcome {
    match outcome {
        ConnectOutcome::Fetched(outcome) => outcome,
        ConnectOutcome::LoginFailed(e) => panic!("login failed: {e}"),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[tokio::test]
async fn end_to_end_renders_rounded_total() {
    let h = harness(vec![Reply::Holdings(vec![("ICP", 1.23456)])]).await;

    let outcome = fetched(h.controller.on_connect_clicked().await.unwrap());

    assert_eq!(
        outcome,
        FetchOutcome::Populated("Total Rewards: 1.2346 ICP".into())
    );
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(*h.connector.identities.lock(), vec![alice()]);
    assert_eq!(h.canister.calls(), vec![alice()]);
    assert_eq!(h.canister.root_key_fetches.load(Ordering::SeqCst), 1);
    assert_eq!(h.controller.state(), ViewState::Populated);
    assert_eq!(
        h.controller.session().map(|s| s.principal()),
        Some(alice())
    );
    assert_eq!(
        h.view.events(),
        vec![
            Event::Connect(false),
            Event::ShowLoading,
            Event::Total("Total Rewards: 1.2346 ICP".into()),
            Event::HideLoading,
            Event::Connect(true),
        ]
    );
}

#[tokio::test]
async fn rounding_boundary_is_half_up() {
    let h = harness(vec![
        Reply::Holdings(vec![("ICP", 1.23455)]),
        Reply::Holdings(vec![("ICP", 1.23454)]),
    ])
    .await;

    fetched(h.controller.on_connect_clicked().await.unwrap());
    fetched(h.controller.on_connect_clicked().await.unwrap());

    assert_eq!(
        h.view.totals(),
        vec![
            "Total Rewards: 1.2346 ICP".to_string(),
            "Total Rewards: 1.2345 ICP".to_string(),
        ]
    );
}

#[tokio::test]
async fn total_sums_every_line() {
    let h = harness(vec![Reply::Holdings(vec![
        ("ICP", 0.1),
        ("ckBTC", 0.2),
        ("ckETH", 2.0),
    ])])
    .await;

    let outcome = fetched(h.controller.on_connect_clicked().await.unwrap());
    assert_eq!(
        outcome,
        FetchOutcome::Populated("Total Rewards: 2.3000 ICP".into())
    );
}

#[tokio::test]
async fn empty_summary_renders_zero() {
    let h = harness(vec![Reply::Holdings(vec![])]).await;

    let outcome = fetched(h.controller.on_connect_clicked().await.unwrap());
    assert_eq!(
        outcome,
        FetchOutcome::Populated("Total Rewards: 0.0000 ICP".into())
    );
}

#[tokio::test]
async fn cycles_error_shows_top_up_message() {
    let h = harness(vec![Reply::Reject("insufficient cycles: 500")]).await;

    let outcome = fetched(h.controller.on_connect_clicked().await.unwrap());

    assert_eq!(outcome, FetchOutcome::Failed(ErrorClass::InsufficientCycles));
    assert_eq!(h.view.error().as_deref(), Some(INSUFFICIENT_CYCLES_MESSAGE));
    assert_eq!(h.controller.state(), ViewState::Failed);
}

#[tokio::test]
async fn other_error_shows_generic_message() {
    let h = harness(vec![Reply::Reject("canister trapped")]).await;

    let outcome = fetched(h.controller.on_connect_clicked().await.unwrap());

    assert_eq!(outcome, FetchOutcome::Failed(ErrorClass::Other));
    assert_eq!(h.view.error().as_deref(), Some(GENERIC_ERROR_MESSAGE));
    assert!(h
        .view
        .events()
        .iter()
        .all(|e| !matches!(e, Event::Error(m) if m.contains("trapped"))));
}

#[tokio::test]
async fn transport_failure_is_classified_like_remote_error() {
    let h = harness(vec![
        Reply::Unreachable("connection reset"),
        Reply::Unreachable("replica out of cycles"),
    ])
    .await;

    let first = fetched(h.controller.on_connect_clicked().await.unwrap());
    assert_eq!(first, FetchOutcome::Failed(ErrorClass::Other));

    let second = fetched(h.controller.on_connect_clicked().await.unwrap());
    assert_eq!(second, FetchOutcome::Failed(ErrorClass::InsufficientCycles));
}

#[tokio::test]
async fn loading_hidden_once_per_fetch_on_every_branch() {
    let h = harness(vec![
        Reply::Holdings(vec![("ICP", 1.0)]),
        Reply::Reject("canister trapped"),
        Reply::Unreachable("connection refused"),
    ])
    .await;

    fetched(h.controller.on_connect_clicked().await.unwrap());
    assert_eq!(h.view.count(&Event::HideLoading), 1);

    h.controller.fetch_and_render().await.unwrap();
    assert_eq!(h.view.count(&Event::HideLoading), 2);

    h.controller.fetch_and_render().await.unwrap();
    assert_eq!(h.view.count(&Event::HideLoading), 3);
    assert_eq!(h.view.count(&Event::ShowLoading), 3);
}

#[tokio::test]
async fn fetch_before_login_is_rejected_without_a_call() {
    let h = harness(vec![]).await;

    let err = h.controller.fetch_and_render().await.unwrap_err();

    assert!(matches!(err, WidgetError::NotAuthenticated));
    assert!(h.canister.calls().is_empty());
    assert!(h.connector.identities.lock().is_empty());
    assert!(h.view.events().is_empty());
    assert_eq!(h.controller.state(), ViewState::Idle);
}

#[tokio::test]
async fn login_failure_restores_trigger_silently() {
    let mut setup = Setup::new(FakeCanister::replying(vec![]));
    setup.login_succeeds = false;
    let h = setup.build().await;

    let outcome = h.controller.on_connect_clicked().await.unwrap();

    assert!(matches!(
        outcome,
        ConnectOutcome::LoginFailed(AuthError::Cancelled)
    ));
    assert_eq!(
        h.view.events(),
        vec![Event::Connect(false), Event::Connect(true)]
    );
    assert_eq!(h.controller.state(), ViewState::Idle);
    assert!(!h.controller.is_authenticated());
    assert!(h.canister.calls().is_empty());
}

#[tokio::test]
async fn second_connect_reuses_session() {
    let h = harness(vec![
        Reply::Reject("canister trapped"),
        Reply::Holdings(vec![("ICP", 3.0)]),
    ])
    .await;

    fetched(h.controller.on_connect_clicked().await.unwrap());
    assert_eq!(h.controller.state(), ViewState::Failed);

    let outcome = fetched(h.controller.on_connect_clicked().await.unwrap());
    assert_eq!(
        outcome,
        FetchOutcome::Populated("Total Rewards: 3.0000 ICP".into())
    );
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.connector.identities.lock().len(), 1);
    assert_eq!(h.canister.calls(), vec![alice(), alice()]);
}

#[tokio::test]
async fn production_skips_root_key() {
    let mut setup = Setup::new(FakeCanister::replying(vec![Reply::Holdings(vec![])]));
    setup.network = Network::Production;
    let h = setup.build().await;

    fetched(h.controller.on_connect_clicked().await.unwrap());
    assert_eq!(h.canister.root_key_fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn actor_creation_failure_takes_failed_path() {
    let h = Setup::new(FakeCanister::without_root_key()).build().await;

    let outcome = fetched(h.controller.on_connect_clicked().await.unwrap());

    assert_eq!(outcome, FetchOutcome::Failed(ErrorClass::Other));
    assert_eq!(h.view.error().as_deref(), Some(GENERIC_ERROR_MESSAGE));
    assert!(!h.controller.is_authenticated());
    assert!(h.canister.calls().is_empty());
    assert_eq!(h.view.events().last(), Some(&Event::Connect(true)));
}

#[tokio::test]
async fn wallet_path_converges() {
    let wallet = Arc::new(FakeWallet {
        principal: Principal::self_authenticating(b"wallet"),
        whitelists: Mutex::new(Vec::new()),
    });
    let mut setup = Setup::new(FakeCanister::replying(vec![Reply::Holdings(vec![(
        "ICP", 5.5,
    )])]));
    setup.wallet = Some(wallet.clone());
    let h = setup.build().await;

    let outcome = fetched(h.controller.on_connect_clicked().await.unwrap());

    assert_eq!(
        outcome,
        FetchOutcome::Populated("Total Rewards: 5.5000 ICP".into())
    );
    assert_eq!(*wallet.whitelists.lock(), vec![vec![canister_id()]]);
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.canister.calls(), vec![wallet.principal]);
}

#[tokio::test]
async fn stale_response_is_discarded() {
    let h = harness(vec![Reply::Holdings(vec![("ICP", 0.5)])]).await;
    fetched(h.controller.on_connect_clicked().await.unwrap());

    let slow = h.canister.push_gated(Reply::Holdings(vec![("ICP", 1.0)]));
    h.canister.push(Reply::Holdings(vec![("ICP", 2.0)]));

    let first = {
        let controller = h.controller.clone();
        tokio::spawn(async move { controller.fetch_and_render().await })
    };
    while h.canister.calls().len() < 2 {
        tokio::task::yield_now().await;
    }

    let second = h.controller.fetch_and_render().await.unwrap();
    assert_eq!(
        second,
        FetchOutcome::Populated("Total Rewards: 2.0000 ICP".into())
    );

    slow.send(()).unwrap();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first, FetchOutcome::Discarded);

    assert_eq!(
        h.view.totals(),
        vec![
            "Total Rewards: 0.5000 ICP".to_string(),
            "Total Rewards: 2.0000 ICP".to_string(),
        ]
    );
    assert_eq!(h.view.count(&Event::HideLoading), 3);
    assert_eq!(h.controller.state(), ViewState::Populated);
}

#[tokio::test]
async fn logout_drops_session() {
    let h = harness(vec![Reply::Holdings(vec![("ICP", 1.0)])]).await;

    fetched(h.controller.on_connect_clicked().await.unwrap());
    assert!(h.controller.is_authenticated());

    h.controller.logout().await.unwrap();

    assert!(!h.controller.is_authenticated());
    assert_eq!(h.controller.state(), ViewState::Idle);
    assert!(matches!(
        h.controller.fetch_and_render().await,
        Err(WidgetError::NotAuthenticated)
    ));
}

/// Saves and loads normally, but cannot forget the login.
struct UnclearableStore(MemorySessionStore);

impl SessionStore for UnclearableStore {
    fn load(&self) -> bx_identity::Result<Option<StoredSession>> {
        self.0.load()
    }

    fn save(&self, session: &StoredSession) -> bx_identity::Result<()> {
        self.0.save(session)
    }

    fn clear(&self) -> bx_identity::Result<()> {
        Err(AuthError::Store("read-only session file".into()))
    }
}

#[tokio::test]
async fn logout_drops_session_when_store_fails() {
    let mut setup = Setup::new(FakeCanister::replying(vec![Reply::Holdings(vec![(
        "ICP", 1.0,
    )])]));
    setup.store = Some(Arc::new(UnclearableStore(MemorySessionStore::new())));
    let h = setup.build().await;

    fetched(h.controller.on_connect_clicked().await.unwrap());
    assert_eq!(h.controller.state(), ViewState::Populated);

    let result = h.controller.logout().await;

    assert!(matches!(
        result,
        Err(WidgetError::Auth(AuthError::Store(_)))
    ));
    assert!(!h.controller.is_authenticated());
    assert!(h.controller.session().is_none());
    assert_eq!(h.controller.state(), ViewState::Idle);
    assert!(matches!(
        h.controller.fetch_and_render().await,
        Err(WidgetError::NotAuthenticated)
    ));
    assert_eq!(h.canister.calls().len(), 1);
}

// Session expiry follows the wall clock, so these run on real time.
#[tokio::test]
async fn expired_session_is_not_used() {
    let mut setup = Setup::new(FakeCanister::replying(vec![
        Reply::Holdings(vec![("ICP", 1.0)]),
        Reply::Holdings(vec![("ICP", 2.0)]),
    ]));
    setup.session_ttl = Some(chrono::Duration::milliseconds(10));
    let h = setup.build().await;

    fetched(h.controller.on_connect_clicked().await.unwrap());
    assert!(h.controller.is_authenticated());

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!h.controller.is_authenticated());
    assert!(matches!(
        h.controller.fetch_and_render().await,
        Err(WidgetError::NotAuthenticated)
    ));
    assert_eq!(h.canister.calls().len(), 1);
    assert!(h.controller.session().is_none());

    let outcome = fetched(h.controller.on_connect_clicked().await.unwrap());

    assert_eq!(
        outcome,
        FetchOutcome::Populated("Total Rewards: 2.0000 ICP".into())
    );
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 2);
    assert_eq!(h.canister.calls().len(), 2);
    assert_eq!(h.controller.state(), ViewState::Populated);
}

#[tokio::test(start_paused = true)]
async fn back_to_back_errors_each_clear() {
    let h = harness(vec![
        Reply::Reject("canister trapped"),
        Reply::Reject("insufficient cycles: 500"),
    ])
    .await;

    // t = 0
    fetched(h.controller.on_connect_clicked().await.unwrap());
    assert_eq!(h.view.error().as_deref(), Some(GENERIC_ERROR_MESSAGE));

    // t = 1
    tokio::time::sleep(Duration::from_secs(1)).await;
    fetched(h.controller.on_connect_clicked().await.unwrap());
    assert_eq!(h.view.error().as_deref(), Some(INSUFFICIENT_CYCLES_MESSAGE));

    // t = 4.5: the second error is up, no timer has fired yet
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(h.view.error().as_deref(), Some(INSUFFICIENT_CYCLES_MESSAGE));
    assert_eq!(h.view.count(&Event::ClearError), 0);

    // t = 5.5: the first timer fired and cleared the display
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.view.error(), None);
    assert_eq!(h.view.count(&Event::ClearError), 1);

    // t = 6.5: both timers fired
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.view.error(), None);
    assert_eq!(h.view.count(&Event::ClearError), 2);
}
