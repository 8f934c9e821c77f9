//! Credential store abstraction.
//!
//! The credential record is owned by the hosting context. The client only
//! reads it and, after a login or refresh, offers the updated tokens back.
//! Contexts without persistence simply decline the write: the fresh tokens
//! are used for the current call and re-issued on the next one.
//!
//! Cross-call token updates are read-modify-write without a lock; two
//! independent callers sharing one store can race on a refresh (last writer
//! wins). The trait seam is where locking would go if that ever matters.

use async_trait::async_trait;
use claira_types::Credentials;
use tokio::sync::RwLock;

/// Access to the hosting context's credential record.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Snapshot of the current credential.
    async fn get(&self) -> Credentials;

    /// Offer an updated credential back to the store.
    ///
    /// Returns `false` when the context cannot persist (the update is then
    /// used transiently for the current call only).
    async fn try_set(&self, credentials: Credentials) -> bool;
}

/// In-memory credential store.
pub struct MemoryStore {
    credentials: RwLock<Credentials>,
    writable: bool,
}

impl MemoryStore {
    /// Store that accepts token write-backs.
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials: RwLock::new(credentials), writable: true }
    }

    /// Store that declines every write, modeling a host without a
    /// credential-persistence capability.
    pub fn read_only(credentials: Credentials) -> Self {
        Self { credentials: RwLock::new(credentials), writable: false }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn get(&self) -> Credentials {
        self.credentials.read().await.clone()
    }

    async fn try_set(&self, credentials: Credentials) -> bool {
        if !self.writable {
            return false;
        }
        *self.credentials.write().await = credentials;
        true
    }
}
