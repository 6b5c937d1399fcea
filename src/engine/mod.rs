//! SessionEngine - reconciles the stored session with the live wallet.
//!
//! # Pass
//!
//! ```text
//! wallet change ──► prepare (suspends: dialog, signer, signature)
//!                      │  no mutation; dropped if superseded
//!                      ▼
//!                   apply  (store → context → close dialog → redirect)
//! ```
//!
//! At most one pass runs at a time. `prepare` only reads; every write to the
//! store and the context happens in `apply`, after all suspending steps have
//! succeeded. A failed or cancelled `prepare` therefore leaves both exactly
//! as they were.
//!
//! # Operations
//!
//! | Method | Trigger |
//! |--------|---------|
//! | `run` | observer loop, one pass per wallet notification |
//! | `reconcile` | a single pass against the current wallet state |
//! | `connect` | "Connect Wallet" button |
//! | `disconnect` | exit button |

mod decide;

pub use decide::{decide, Decision, DisconnectReason, LiveSession};

use crate::config::SessionConfig;
use crate::core::address::Address;
use crate::core::network::ChainId;
use crate::context::{SessionContext, SessionView};
use crate::error::{SessionError, SessionResult};
use crate::navigation::{Navigator, Route};
use crate::session::SessionRecord;
use crate::store::{KvBackend, SessionStore};
use crate::wallet::{Signature, Signer, WalletError, WalletProvider};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

/// Outcome of a completed pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// Nothing to reconcile.
    Idle,
    Resumed { record: SessionRecord },
    Authenticated { record: SessionRecord, signature: Signature },
    Disconnected { reason: DisconnectReason },
}

impl Transition {
    pub fn record(&self) -> Option<&SessionRecord> {
        match self {
            Transition::Resumed { record } | Transition::Authenticated { record, .. } => Some(record),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum EngineEvent {
    Transition { transition: Transition, at: DateTime<Utc> },
    Failed { error: SessionError, at: DateTime<Utc> },
}

/// Result of `prepare`: everything `apply` needs, nothing applied yet.
enum Plan {
    Idle,
    Disconnect(DisconnectReason),
    Resume { record: SessionRecord, signer: Arc<dyn Signer> },
    Authenticate { record: SessionRecord, signer: Arc<dyn Signer>, signature: Signature },
}

const EVENT_CAPACITY: usize = 64;

pub struct SessionEngine {
    config: SessionConfig,
    wallet: Arc<dyn WalletProvider>,
    store: SessionStore,
    context: SessionContext,
    navigator: Arc<dyn Navigator>,
    pass: Mutex<()>,
    events: broadcast::Sender<EngineEvent>,
}

impl SessionEngine {
    pub fn new(
        config: SessionConfig,
        wallet: Arc<dyn WalletProvider>,
        backend: Box<dyn KvBackend>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let store = SessionStore::new(backend)
            .with_key(config.storage_key.clone())
            .with_networks(config.networks.clone());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { config, wallet, store, context: SessionContext::new(), navigator, pass: Mutex::new(()), events }
    }

    pub fn config(&self) -> &SessionConfig { &self.config }
    pub fn view(&self) -> SessionView { self.context.view() }
    pub fn events(&self) -> broadcast::Receiver<EngineEvent> { self.events.subscribe() }
    pub fn stored_record(&self) -> Option<SessionRecord> { self.store.load() }

    /// One serialized pass against the wallet's current state.
    ///
    /// A wallet notification that lands while the pass is suspended (e.g. a
    /// chain switch during the signature prompt) restarts it from the new
    /// state, within the same `max_restarts` budget.
    pub async fn reconcile(&self) -> SessionResult<Transition> {
        let _pass = self.pass.lock().await;
        let mut changes = self.wallet.subscribe();
        changes.borrow_and_update();

        let mut restarts = 0;
        let plan = loop {
            tokio::select! {
                plan = self.prepare_settled() => break plan,
                changed = changes.changed() => {
                    if changed.is_err() {
                        break self.prepare_settled().await;
                    }
                    if restarts >= self.config.max_restarts {
                        break Err(SessionError::Superseded);
                    }
                    restarts += 1;
                    debug!(restarts, "wallet state changed mid-pass, restarting");
                }
            }
        };
        self.finish(plan).await
    }

    /// User-initiated teardown. Safe to call repeatedly.
    pub async fn disconnect(&self) -> Transition {
        let _pass = self.pass.lock().await;
        let transition = self.teardown(DisconnectReason::UserRequested).await;
        self.emit(Ok(&transition));
        transition
    }

    /// Open the connect dialog unless the wallet is already connected.
    ///
    /// The resulting connection reaches the engine as a wallet notification;
    /// this call does not reconcile by itself.
    pub async fn connect(&self) -> SessionResult<()> {
        if self.wallet.state().is_connected {
            return Ok(());
        }
        self.open_dialog().await
    }

    /// Observe the wallet until shutdown, one pass per notification.
    ///
    /// A notification that arrives while a pass is still preparing drops
    /// that pass and starts a new one from the current state.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let mut changes = self.wallet.subscribe();
        changes.borrow_and_update();
        info!(app = %self.config.app, "session engine started");

        loop {
            {
                let _pass = self.pass.lock().await;
                let plan = tokio::select! {
                    plan = self.prepare_settled() => Some(plan),
                    changed = changes.changed() => {
                        if changed.is_err() { break; }
                        debug!("wallet state changed mid-pass, superseding");
                        None
                    }
                    _ = shutdown.recv() => break,
                };
                let Some(plan) = plan else { continue };
                if let Err(e) = self.finish(plan).await {
                    warn!("reconciliation aborted: {}", e);
                }
            }

            tokio::select! {
                changed = changes.changed() => if changed.is_err() { break },
                _ = shutdown.recv() => break,
            }
        }

        info!(app = %self.config.app, "session engine stopped");
        Ok(())
    }

    async fn finish(&self, plan: SessionResult<Plan>) -> SessionResult<Transition> {
        let result = match plan {
            Ok(plan) => self.apply(plan).await,
            Err(e) => Err(e),
        };
        self.emit(result.as_ref());
        result
    }

    fn emit(&self, result: Result<&Transition, &SessionError>) {
        let at = Utc::now();
        let event = match result {
            Ok(transition) => EngineEvent::Transition { transition: transition.clone(), at },
            Err(error) => EngineEvent::Failed { error: error.clone(), at },
        };
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    async fn prepare_settled(&self) -> SessionResult<Plan> {
        let mut restarts = 0;
        loop {
            match self.prepare().await {
                Err(SessionError::Superseded) if restarts < self.config.max_restarts => {
                    restarts += 1;
                    debug!(restarts, "live state moved during pass, restarting");
                }
                other => return other,
            }
        }
    }

    async fn prepare(&self) -> SessionResult<Plan> {
        let live = LiveSession::from_state(&self.wallet.state())?;
        let connected = live.is_some();
        let record = self.store.load();
        let mismatch = match (&record, &live) {
            (Some(stored), Some(live)) if stored.account != live.account => Some(SessionError::AccountMismatch {
                stored: stored.account.to_string(),
                live: live.account.to_string(),
            }),
            _ => None,
        };

        match decide(record, live) {
            Decision::Idle if !connected && !self.context.snapshot().is_empty() => {
                Ok(Plan::Disconnect(DisconnectReason::WalletDisconnected))
            }
            Decision::Idle => Ok(Plan::Idle),
            Decision::Disconnect(reason) => {
                if let Some(e) = mismatch {
                    warn!("{}, tearing session down", e);
                }
                Ok(Plan::Disconnect(reason))
            }
            Decision::Resume(record) => {
                let signer = self.bound_signer(&record.account, record.chain_id).await?;
                self.ensure_current(&record.account, record.chain_id)?;
                debug!(account = %record.account, chain_id = record.chain_id, "resuming stored session");
                Ok(Plan::Resume { record, signer })
            }
            Decision::Authenticate(live) => {
                if !self.config.supports(live.chain_id) {
                    return Err(SessionError::UnsupportedChain(live.chain_id));
                }
                self.ensure_connected().await?;
                let signer = self.bound_signer(&live.account, live.chain_id).await?;
                debug!(account = %live.account, chain_id = live.chain_id, "requesting proof-of-control signature");
                let signature = bounded(self.config.sign_timeout, "signature", signer.sign_message(&self.config.sign_message))
                    .await?
                    .map_err(|e| wallet_error(e, SessionError::SignatureRejected))?;
                self.ensure_current(&live.account, live.chain_id)?;
                Ok(Plan::Authenticate { record: SessionRecord::new(live.account, live.chain_id), signer, signature })
            }
        }
    }

    async fn apply(&self, plan: Plan) -> SessionResult<Transition> {
        match plan {
            Plan::Idle => Ok(Transition::Idle),
            Plan::Disconnect(reason) => Ok(self.teardown(reason).await),
            Plan::Resume { record, signer } => {
                self.context.establish(record.clone(), signer);
                info!(account = %record.account, chain_id = record.chain_id, "session resumed");
                self.navigator.navigate(Route::Home);
                Ok(Transition::Resumed { record })
            }
            Plan::Authenticate { record, signer, signature } => {
                // persist first: a failed save leaves the context untouched
                self.store.save(&record)?;
                self.context.establish(record.clone(), signer);
                info!(account = %record.account, chain_id = record.chain_id, "session authenticated");
                if self.wallet.is_dialog_open() {
                    match bounded(self.config.provider_timeout, "close dialog", self.wallet.close_dialog()).await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => warn!("closing wallet dialog failed: {}", e),
                        Err(e) => warn!("{}", e),
                    }
                }
                self.navigator.navigate(Route::Home);
                Ok(Transition::Authenticated { record, signature })
            }
        }
    }

    /// Clear local state first; the provider's acknowledgement is best effort.
    async fn teardown(&self, reason: DisconnectReason) -> Transition {
        if let Err(e) = self.store.clear() {
            warn!(key = self.store.key(), "clearing stored session failed: {}", e);
        }
        self.context.clear();
        match bounded(self.config.provider_timeout, "disconnect", self.wallet.disconnect()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("wallet disconnect failed: {}", e),
            Err(e) => warn!("{}", e),
        }
        info!(reason = reason.as_str(), "session disconnected");
        self.navigator.navigate(Route::Home);
        Transition::Disconnected { reason }
    }

    async fn open_dialog(&self) -> SessionResult<()> {
        bounded(self.config.dialog_timeout, "connect dialog", self.wallet.open_connect_dialog())
            .await?
            .map_err(|e| wallet_error(e, SessionError::UserCancelled))
    }

    async fn ensure_connected(&self) -> SessionResult<()> {
        if self.wallet.state().is_connected {
            return Ok(());
        }
        self.open_dialog().await
    }

    /// Signer for the pass inputs. One bound elsewhere means the wallet moved.
    async fn bound_signer(&self, account: &Address, chain_id: ChainId) -> SessionResult<Arc<dyn Signer>> {
        let signer = bounded(self.config.provider_timeout, "signer", self.wallet.signer())
            .await?
            .map_err(|e| wallet_error(e, SessionError::UserCancelled))?;
        let same_account = signer.address().eq_ignore_ascii_case(account.as_str());
        if !same_account || signer.chain_id() != chain_id {
            debug!(signer = signer.address(), signer_chain = signer.chain_id(), "signer bound to a different connection");
            return Err(SessionError::Superseded);
        }
        Ok(signer)
    }

    fn ensure_current(&self, account: &Address, chain_id: ChainId) -> SessionResult<()> {
        match LiveSession::from_state(&self.wallet.state())? {
            Some(now) if now.account == *account && now.chain_id == chain_id => Ok(()),
            _ => Err(SessionError::Superseded),
        }
    }
}

async fn bounded<T>(limit: Duration, step: &'static str, fut: impl Future<Output = T>) -> SessionResult<T> {
    tokio::time::timeout(limit, fut).await.map_err(|_| SessionError::ProviderTimeout(step))
}

fn wallet_error(e: WalletError, rejected: SessionError) -> SessionError {
    match e {
        WalletError::Rejected => rejected,
        WalletError::Unavailable(m) => SessionError::CapabilityUnavailable(m),
        WalletError::Provider(m) => SessionError::Provider(m),
    }
}
