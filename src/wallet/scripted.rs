//! ScriptedWallet - in-process provider whose prompts answer from a script.

use super::{LiveWalletState, Signature, Signer, WalletError, WalletProvider};
use crate::core::network::ChainId;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// How the "user" answers the next signature prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignBehavior {
    #[default]
    Approve,
    Reject,
    Fail,
    /// Never answers; the request stays pending until dropped.
    Hold,
}

#[derive(Default)]
struct Counters {
    sign_requests: AtomicUsize,
    disconnects: AtomicUsize,
    dialog_opens: AtomicUsize,
    dialog_closes: AtomicUsize,
}

struct Inner {
    state: watch::Sender<LiveWalletState>,
    dialog_open: AtomicBool,
    sign: Mutex<SignBehavior>,
    /// Account the user picks when the connect dialog opens.
    dialog_account: Mutex<Option<(String, ChainId)>>,
    /// Dialog stays up without the user ever picking.
    hold_dialog: AtomicBool,
    fail_disconnect: AtomicBool,
    fail_signer: AtomicBool,
    counters: Counters,
}

#[derive(Clone)]
pub struct ScriptedWallet {
    inner: Arc<Inner>,
}

impl Default for ScriptedWallet {
    fn default() -> Self { Self::new() }
}

impl ScriptedWallet {
    pub fn new() -> Self {
        let (state, _) = watch::channel(LiveWalletState::disconnected());
        Self {
            inner: Arc::new(Inner {
                state,
                dialog_open: AtomicBool::new(false),
                sign: Mutex::new(SignBehavior::default()),
                dialog_account: Mutex::new(None),
                hold_dialog: AtomicBool::new(false),
                fail_disconnect: AtomicBool::new(false),
                fail_signer: AtomicBool::new(false),
                counters: Counters::default(),
            }),
        }
    }

    pub fn connected(address: &str, chain_id: ChainId) -> Self {
        let wallet = Self::new();
        wallet.connect(address, chain_id);
        wallet
    }

    fn publish(&self, next: LiveWalletState) {
        self.inner.state.send_if_modified(|current| {
            if *current == next { return false; }
            *current = next;
            true
        });
    }

    // Wallet-side events
    pub fn connect(&self, address: &str, chain_id: ChainId) { self.publish(LiveWalletState::connected(address, chain_id)); }
    pub fn switch_chain(&self, chain_id: ChainId) {
        let mut next = self.inner.state.borrow().clone();
        next.chain_id = Some(chain_id);
        self.publish(next);
    }
    pub fn switch_account(&self, address: &str) {
        let mut next = self.inner.state.borrow().clone();
        next.address = Some(address.to_string());
        self.publish(next);
    }
    pub fn drop_connection(&self) { self.publish(LiveWalletState::disconnected()); }

    // Script
    pub fn set_sign_behavior(&self, behavior: SignBehavior) {
        *self.inner.sign.lock().unwrap_or_else(|p| p.into_inner()) = behavior;
    }
    pub fn set_dialog_account(&self, account: Option<(&str, ChainId)>) {
        *self.inner.dialog_account.lock().unwrap_or_else(|p| p.into_inner()) = account.map(|(a, c)| (a.to_string(), c));
    }
    pub fn set_dialog_open(&self, open: bool) { self.inner.dialog_open.store(open, Ordering::SeqCst); }
    pub fn hold_dialog(&self, hold: bool) { self.inner.hold_dialog.store(hold, Ordering::SeqCst); }
    pub fn fail_disconnect(&self, fail: bool) { self.inner.fail_disconnect.store(fail, Ordering::SeqCst); }
    pub fn fail_signer(&self, fail: bool) { self.inner.fail_signer.store(fail, Ordering::SeqCst); }

    // Observations
    pub fn sign_requests(&self) -> usize { self.inner.counters.sign_requests.load(Ordering::SeqCst) }
    pub fn disconnects(&self) -> usize { self.inner.counters.disconnects.load(Ordering::SeqCst) }
    pub fn dialog_opens(&self) -> usize { self.inner.counters.dialog_opens.load(Ordering::SeqCst) }
    pub fn dialog_closes(&self) -> usize { self.inner.counters.dialog_closes.load(Ordering::SeqCst) }
}

#[async_trait]
impl WalletProvider for ScriptedWallet {
    fn state(&self) -> LiveWalletState { self.inner.state.borrow().clone() }

    fn subscribe(&self) -> watch::Receiver<LiveWalletState> { self.inner.state.subscribe() }

    fn is_dialog_open(&self) -> bool { self.inner.dialog_open.load(Ordering::SeqCst) }

    async fn open_connect_dialog(&self) -> Result<(), WalletError> {
        self.inner.counters.dialog_opens.fetch_add(1, Ordering::SeqCst);
        self.inner.dialog_open.store(true, Ordering::SeqCst);
        if self.inner.hold_dialog.load(Ordering::SeqCst) {
            return std::future::pending().await;
        }
        let pick = self.inner.dialog_account.lock().unwrap_or_else(|p| p.into_inner()).clone();
        match pick {
            Some((address, chain_id)) => {
                self.connect(&address, chain_id);
                Ok(())
            }
            None => {
                // nothing picked: the user closed the dialog
                self.inner.dialog_open.store(false, Ordering::SeqCst);
                Err(WalletError::Rejected)
            }
        }
    }

    async fn close_dialog(&self) -> Result<(), WalletError> {
        self.inner.counters.dialog_closes.fetch_add(1, Ordering::SeqCst);
        self.inner.dialog_open.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.inner.counters.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_disconnect.load(Ordering::SeqCst) {
            return Err(WalletError::Provider("disconnect refused".into()));
        }
        self.inner.dialog_open.store(false, Ordering::SeqCst);
        self.drop_connection();
        Ok(())
    }

    async fn signer(&self) -> Result<Arc<dyn Signer>, WalletError> {
        if self.inner.fail_signer.load(Ordering::SeqCst) {
            return Err(WalletError::Unavailable("no signer".into()));
        }
        let state = self.state();
        match (state.is_connected, state.address, state.chain_id) {
            (true, Some(address), Some(chain_id)) => Ok(Arc::new(ScriptedSigner { address, chain_id, inner: self.inner.clone() })),
            _ => Err(WalletError::Unavailable("not connected".into())),
        }
    }
}

/// Signer handed out by `ScriptedWallet`, bound to the connection at the
/// time it was obtained.
pub struct ScriptedSigner {
    address: String,
    chain_id: ChainId,
    inner: Arc<Inner>,
}

#[async_trait]
impl Signer for ScriptedSigner {
    fn address(&self) -> &str { &self.address }
    fn chain_id(&self) -> ChainId { self.chain_id }

    async fn sign_message(&self, message: &str) -> Result<Signature, WalletError> {
        self.inner.counters.sign_requests.fetch_add(1, Ordering::SeqCst);
        let behavior = *self.inner.sign.lock().unwrap_or_else(|p| p.into_inner());
        match behavior {
            SignBehavior::Approve => Ok(proof_signature(&self.address, message)),
            SignBehavior::Reject => Err(WalletError::Rejected),
            SignBehavior::Fail => Err(WalletError::Provider("signing backend failed".into())),
            SignBehavior::Hold => std::future::pending().await,
        }
    }
}

/// Deterministic stand-in signature: `0x` + hex(sha256(address ‖ "\n" ‖ message)).
pub fn proof_signature(address: &str, message: &str) -> Signature {
    let mut hasher = Sha256::new();
    hasher.update(address.to_ascii_lowercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(message.as_bytes());
    Signature(format!("0x{}", hex::encode(hasher.finalize())))
}
