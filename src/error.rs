//! Error taxonomy for session reconciliation.

use crate::core::network::ChainId;
use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

/// Failures a reconciliation pass can surface.
///
/// Any of these aborts the pass before the commit step, so the store and the
/// session context keep whatever they held before the attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("persisted session record is malformed: {0}")]
    MalformedPersistedRecord(String),

    #[error("live account {live} does not match stored account {stored}")]
    AccountMismatch { stored: String, live: String },

    #[error("signature request rejected")]
    SignatureRejected,

    #[error("user closed the wallet dialog")]
    UserCancelled,

    #[error("wallet provider timed out during {0}")]
    ProviderTimeout(&'static str),

    #[error("wallet provider error: {0}")]
    Provider(String),

    #[error("wallet capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    #[error("chain {0} is not a supported network")]
    UnsupportedChain(ChainId),

    #[error("live wallet state changed mid-pass")]
    Superseded,

    #[error("session storage: {0}")]
    Storage(String),
}

impl SessionError {
    /// Errors produced by the user declining something, as opposed to a
    /// provider or storage failure.
    pub fn is_user_abort(&self) -> bool {
        matches!(self, SessionError::SignatureRejected | SessionError::UserCancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_aborts_are_distinguished() {
        assert!(SessionError::SignatureRejected.is_user_abort());
        assert!(SessionError::UserCancelled.is_user_abort());
        assert!(!SessionError::ProviderTimeout("sign").is_user_abort());
        assert!(!SessionError::Provider("rpc down".into()).is_user_abort());
    }

    #[test]
    fn messages_name_the_failure() {
        assert_eq!(SessionError::UnsupportedChain(137).to_string(), "chain 137 is not a supported network");
        assert_eq!(SessionError::ProviderTimeout("sign").to_string(), "wallet provider timed out during sign");
        let mismatch = SessionError::AccountMismatch { stored: "0xAA".into(), live: "0xBB".into() };
        assert_eq!(mismatch.to_string(), "live account 0xBB does not match stored account 0xAA");
    }
}
