//! Persisted session store.
//!
//! ```text
//! SessionStore (record codec, soft-fail load)
//!     │
//!     └── KvBackend (string key → string value)
//!           ├── MemoryKv   in-process map
//!           └── FileKv     one JSON file per key (native)
//! ```
//!
//! `load` never fails: an absent, unreadable or invalid value is treated as
//! no record and logged. `save` replaces the whole record; `clear` is
//! idempotent.

#[cfg(feature = "native")]
mod file;

#[cfg(feature = "native")]
pub use file::FileKv;

use crate::core::keys::storage;
use crate::core::network::{self, Network};
use crate::error::{SessionError, SessionResult};
use crate::session::SessionRecord;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("lock poisoned")]
    Poisoned,

    #[error("invalid key: {0:?}")]
    InvalidKey(String),
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self { SessionError::Storage(e.to_string()) }
}

/// Minimal key-value medium backing the session store.
pub trait KvBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process backend. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKv {
    pub fn new() -> Self { Self::default() }
}

impl KvBackend for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.lock().map_err(|_| StoreError::Poisoned)?.get(key).cloned())
    }
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)?.insert(key.to_string(), value.to_string());
        Ok(())
    }
    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)?.remove(key);
        Ok(())
    }
}

/// Typed access to the single persisted session record.
pub struct SessionStore {
    backend: Box<dyn KvBackend>,
    key: String,
    networks: Vec<Network>,
}

impl SessionStore {
    pub fn new(backend: Box<dyn KvBackend>) -> Self {
        Self { backend, key: storage::USER_ACCOUNT.to_string(), networks: Network::builtin() }
    }
    pub fn with_key(mut self, key: impl Into<String>) -> Self { self.key = key.into(); self }
    /// Records bound to a chain outside this set load as absent.
    pub fn with_networks(mut self, networks: Vec<Network>) -> Self { self.networks = networks; self }

    pub fn key(&self) -> &str { &self.key }

    pub fn load(&self) -> Option<SessionRecord> {
        match self.try_load() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(key = %self.key, "ignoring stored session: {}", e);
                None
            }
        }
    }

    /// Like `load`, but reports why a stored value was rejected.
    pub fn try_load(&self) -> SessionResult<Option<SessionRecord>> {
        let Some(raw) = self.backend.get(&self.key)? else { return Ok(None) };
        if raw.trim().is_empty() || raw.trim() == "null" {
            return Ok(None);
        }
        let record: SessionRecord = serde_json::from_str(&raw)
            .map_err(|e| SessionError::MalformedPersistedRecord(e.to_string()))?;
        if network::find(&self.networks, record.chain_id).is_none() {
            return Err(SessionError::MalformedPersistedRecord(format!("unsupported chain {}", record.chain_id)));
        }
        Ok(Some(record))
    }

    pub fn save(&self, record: &SessionRecord) -> SessionResult<()> {
        let raw = serde_json::to_string(record).map_err(|e| SessionError::Storage(e.to_string()))?;
        self.backend.set(&self.key, &raw)?;
        Ok(())
    }

    pub fn clear(&self) -> SessionResult<()> {
        self.backend.remove(&self.key)?;
        Ok(())
    }
}
