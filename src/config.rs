//! Session configuration - passed from higher layers

use crate::core::keys::{proof, storage};
use crate::core::network::{self, ChainId, Network};
use std::time::Duration;

pub const DEFAULT_SIGN_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_DIALOG_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RESTARTS: usize = 3;

/// Engine configuration. Higher layers construct this.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub app: String,
    pub storage_key: String,
    pub sign_message: String,
    pub networks: Vec<Network>,
    /// Bound on the signature prompt.
    pub sign_timeout: Duration,
    /// Bound on the connect dialog.
    pub dialog_timeout: Duration,
    /// Bound on non-interactive provider calls (signer, disconnect, close).
    pub provider_timeout: Duration,
    /// Passes re-run after a mid-pass state change before giving up.
    pub max_restarts: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app: "walletgate".into(),
            storage_key: storage::USER_ACCOUNT.into(),
            sign_message: proof::DEFAULT_MESSAGE.into(),
            networks: Network::builtin(),
            sign_timeout: DEFAULT_SIGN_TIMEOUT,
            dialog_timeout: DEFAULT_DIALOG_TIMEOUT,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            max_restarts: DEFAULT_MAX_RESTARTS,
        }
    }
}

impl SessionConfig {
    pub fn new(app: impl Into<String>) -> Self {
        Self { app: app.into(), ..Default::default() }
    }
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self { self.storage_key = key.into(); self }
    pub fn with_sign_message(mut self, message: impl Into<String>) -> Self { self.sign_message = message.into(); self }
    pub fn with_networks(mut self, networks: Vec<Network>) -> Self { self.networks = networks; self }
    pub fn with_sign_timeout(mut self, t: Duration) -> Self { self.sign_timeout = t; self }
    pub fn with_dialog_timeout(mut self, t: Duration) -> Self { self.dialog_timeout = t; self }
    pub fn with_provider_timeout(mut self, t: Duration) -> Self { self.provider_timeout = t; self }
    pub fn with_max_restarts(mut self, n: usize) -> Self { self.max_restarts = n; self }

    pub fn supports(&self, chain_id: ChainId) -> bool { network::find(&self.networks, chain_id).is_some() }
    pub fn network(&self, chain_id: ChainId) -> Option<&Network> { network::find(&self.networks, chain_id) }
}
