//! Key and constant registry for session persistence and proof messages.
//!
//! Centralized so the store, the engine and the CLI agree on names.

/// Storage keys
pub mod storage {
    /// Key under which the session record is persisted.
    pub const USER_ACCOUNT: &str = "userAccount";
    /// File extension used by file-backed stores.
    pub const FILE_EXT: &str = "json";
    /// Directory (below the app root) holding persisted values.
    pub const DATA_DIR: &str = "data";
}

/// Proof-of-control message
pub mod proof {
    /// Default message a wallet must sign on fresh authentication.
    pub const DEFAULT_MESSAGE: &str =
        "Welcome to walletgate. Sign this message to prove you control this wallet. It is not a transaction.";
}

/// Short-address truncation
pub mod display {
    pub const PREFIX_LEN: usize = 8;
    pub const SUFFIX_LEN: usize = 6;
    pub const ELLIPSIS: &str = "...";
}

/// Environment variables
pub mod env {
    pub const ROOT: &str = "WALLETGATE_ROOT";
    pub const APP: &str = "WALLETGATE_APP";
    pub const LOG_JSON: &str = "WALLETGATE_LOG_JSON";
    pub const SIGN_TIMEOUT_SECS: &str = "WALLETGATE_SIGN_TIMEOUT_SECS";
}
