//! Session context - the in-memory signer and user info shared by consumers.
//!
//! One writer, many readers:
//!
//! ```text
//! SessionContext (owned by SessionEngine, crate-private mutators)
//!     │  watch::Sender<SessionSnapshot>
//!     ▼
//! SessionView (Clone, read-only) ── user_info / signer / changed()
//! ```
//!
//! Signer and user info are published together in one snapshot, so a
//! reader never sees one set without the other.

use crate::session::SessionRecord;
use crate::wallet::Signer;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub signer: Option<Arc<dyn Signer>>,
    pub user_info: Option<SessionRecord>,
}

impl SessionSnapshot {
    pub fn is_empty(&self) -> bool { self.signer.is_none() && self.user_info.is_none() }
}

/// Read-write handle. Only the engine holds one.
pub struct SessionContext {
    tx: watch::Sender<SessionSnapshot>,
}

impl Default for SessionContext {
    fn default() -> Self { Self::new() }
}

impl SessionContext {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SessionSnapshot::default());
        Self { tx }
    }

    pub fn view(&self) -> SessionView { SessionView { rx: self.tx.subscribe() } }

    pub(crate) fn establish(&self, record: SessionRecord, signer: Arc<dyn Signer>) {
        self.tx.send_replace(SessionSnapshot { signer: Some(signer), user_info: Some(record) });
    }

    /// Returns false if the context was already empty.
    pub(crate) fn clear(&self) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if snapshot.is_empty() { return false; }
            *snapshot = SessionSnapshot::default();
            true
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot { self.tx.borrow().clone() }
}

/// Read-only observer of the session context.
#[derive(Clone)]
pub struct SessionView {
    rx: watch::Receiver<SessionSnapshot>,
}

impl SessionView {
    pub fn snapshot(&self) -> SessionSnapshot { self.rx.borrow().clone() }
    pub fn user_info(&self) -> Option<SessionRecord> { self.rx.borrow().user_info.clone() }
    pub fn signer(&self) -> Option<Arc<dyn Signer>> { self.rx.borrow().signer.clone() }
    pub fn short_address(&self) -> Option<String> { self.rx.borrow().user_info.as_ref().map(|u| u.short_address.clone()) }
    pub fn is_authenticated(&self) -> bool {
        let snapshot = self.rx.borrow();
        snapshot.signer.is_some() && snapshot.user_info.is_some()
    }

    /// Wait for the next publish. Errors once the engine is dropped.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> { self.rx.changed().await }
}
