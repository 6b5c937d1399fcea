//! Walletgate: wallet session reconciliation. Resume, re-authenticate, or tear down.
//!
//! # Architecture
//!
//! ```text
//! WalletProvider (external: connection, dialog, signer)
//!   │  watch notifications
//!   ▼
//! SessionEngine ── decide(record, live) ──► Transition
//!   │
//!   ├── SessionStore  (persisted record: account, chainId, shortAddress)
//!   │     └── KvBackend: MemoryKv | FileKv
//!   │
//!   ├── SessionContext ──► SessionView (signer + user info, read-only)
//!   │
//!   └── Navigator (redirect to the default view)
//! ```
//!
//! # Transitions
//!
//! | Live wallet | Stored record | Result |
//! |-------------|---------------|--------|
//! | connected | none / other chain | sign proof message → `Authenticated` |
//! | connected | same account + chain | `Resumed` (no signature) |
//! | connected | other account | `Disconnected(AccountSwitched)` |
//! | disconnected | some | `Disconnected(WalletDisconnected)` |
//!
//! # Features
//!
//! - `native` - file-backed store, log subscriber, signal handling, CLI
//!
//! # Usage
//!
//! ```ignore
//! use walletgate::{SessionConfig, SessionEngine, MemoryKv, NavigationLog, ScriptedWallet, Shutdown};
//! use std::sync::Arc;
//!
//! let wallet = ScriptedWallet::connected("0x12D79D457E935110a5fD52351490063Eff3bcD22", 97);
//! let engine = SessionEngine::new(
//!     SessionConfig::new("dapp"),
//!     Arc::new(wallet),
//!     Box::new(MemoryKv::new()),
//!     Arc::new(NavigationLog::new()),
//! );
//! let transition = engine.reconcile().await?;
//! let view = engine.view();
//! println!("{:?}", view.short_address());
//! ```

// =============================================================================
// Shared modules
// =============================================================================
pub mod config;
pub mod context;
pub mod core;
pub mod engine;
pub mod error;
pub mod navigation;
pub mod runtime;
pub mod session;
pub mod store;
pub mod wallet;

// =============================================================================
// Native-only modules
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;

// =============================================================================
// Re-exports
// =============================================================================
pub use config::SessionConfig;
pub use context::{SessionContext, SessionSnapshot, SessionView};
pub use core::address::{short_address, Address};
pub use core::network::{ChainId, Network};
pub use engine::{decide, Decision, DisconnectReason, EngineEvent, LiveSession, SessionEngine, Transition};
pub use error::{SessionError, SessionResult};
pub use navigation::{ChannelNavigator, NavigationLog, Navigator, Route};
pub use runtime::{install_signal_handlers, Shutdown};
pub use session::SessionRecord;
pub use store::{KvBackend, MemoryKv, SessionStore, StoreError};
pub use wallet::{LiveWalletState, ScriptedWallet, Signature, SignBehavior, Signer, WalletError, WalletProvider};

#[cfg(feature = "native")]
pub use store::FileKv;
