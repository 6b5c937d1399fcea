//! Wallet capability - the external provider the engine reconciles against.
//!
//! The provider owns the live connection. This crate only observes it and
//! asks it for a signer; it never drives the wallet protocol itself.
//!
//! # Architecture
//!
//! ```text
//! WalletProvider (trait)
//!     │
//!     ├── state / subscribe  → LiveWalletState {is_connected, address, chain_id}
//!     ├── dialog             → open_connect_dialog / close_dialog / is_dialog_open
//!     ├── disconnect
//!     └── signer             → Signer (trait)
//!                                 └── sign_message(msg) → Signature
//! ```
//!
//! # Implementations
//!
//! | Type | Use |
//! |------|-----|
//! | `ScriptedWallet` | in-process provider with scriptable prompts (CLI simulator, tests) |

mod scripted;

pub use scripted::{ScriptedSigner, ScriptedWallet, SignBehavior};

use crate::core::network::ChainId;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// Provider-defined failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("user rejected the request")]
    Rejected,

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("provider: {0}")]
    Provider(String),
}

/// Snapshot of what the provider currently reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiveWalletState {
    pub is_connected: bool,
    pub address: Option<String>,
    pub chain_id: Option<ChainId>,
}

impl LiveWalletState {
    pub fn connected(address: impl Into<String>, chain_id: ChainId) -> Self {
        Self { is_connected: true, address: Some(address.into()), chain_id: Some(chain_id) }
    }
    pub fn disconnected() -> Self { Self::default() }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature(pub String);

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Signing capability bound to one account on one chain.
#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> &str;
    fn chain_id(&self) -> ChainId;
    async fn sign_message(&self, message: &str) -> Result<Signature, WalletError>;
}

impl fmt::Debug for dyn Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").field("address", &self.address()).field("chain_id", &self.chain_id()).finish()
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn state(&self) -> LiveWalletState;
    /// Notified whenever `is_connected`, `address` or `chain_id` changes.
    fn subscribe(&self) -> watch::Receiver<LiveWalletState>;
    fn is_dialog_open(&self) -> bool;
    async fn open_connect_dialog(&self) -> Result<(), WalletError>;
    async fn close_dialog(&self) -> Result<(), WalletError>;
    async fn disconnect(&self) -> Result<(), WalletError>;
    async fn signer(&self) -> Result<Arc<dyn Signer>, WalletError>;
}
