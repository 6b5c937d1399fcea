//! Transition rules: persisted record × live wallet → what to do.
//!
//! Pure and synchronous. The engine feeds it and carries out the result.
//!
//! | live | record | decision |
//! |------|--------|----------|
//! | disconnected | none | `Idle` |
//! | disconnected | some | `Disconnect(WalletDisconnected)` |
//! | connected | account differs | `Disconnect(AccountSwitched)` |
//! | connected | none, or chain differs | `Authenticate` |
//! | connected | account and chain match | `Resume` |

use crate::core::address::Address;
use crate::core::network::ChainId;
use crate::error::{SessionError, SessionResult};
use crate::session::SessionRecord;
use crate::wallet::LiveWalletState;
use serde::Serialize;

/// A connected wallet with a validated account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSession {
    pub account: Address,
    pub chain_id: ChainId,
}

impl LiveSession {
    /// `None` when the wallet is not connected.
    pub fn from_state(state: &LiveWalletState) -> SessionResult<Option<Self>> {
        if !state.is_connected {
            return Ok(None);
        }
        let address = state
            .address
            .as_deref()
            .ok_or_else(|| SessionError::CapabilityUnavailable("connected without an address".into()))?;
        let chain_id = state
            .chain_id
            .ok_or_else(|| SessionError::CapabilityUnavailable("connected without a chain id".into()))?;
        Ok(Some(Self { account: Address::parse(address)?, chain_id }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectReason {
    /// The wallet now reports a different account than the stored one.
    AccountSwitched,
    WalletDisconnected,
    UserRequested,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::AccountSwitched => "account_switched",
            DisconnectReason::WalletDisconnected => "wallet_disconnected",
            DisconnectReason::UserRequested => "user_requested",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Idle,
    Disconnect(DisconnectReason),
    /// Fresh authentication: signature required.
    Authenticate(LiveSession),
    /// Stored record still valid: no signature.
    Resume(SessionRecord),
}

pub fn decide(record: Option<SessionRecord>, live: Option<LiveSession>) -> Decision {
    let Some(live) = live else {
        return match record {
            Some(_) => Decision::Disconnect(DisconnectReason::WalletDisconnected),
            None => Decision::Idle,
        };
    };
    match record {
        Some(record) if record.account != live.account => Decision::Disconnect(DisconnectReason::AccountSwitched),
        Some(record) if record.chain_id == live.chain_id => Decision::Resume(record),
        _ => Decision::Authenticate(live),
    }
}
