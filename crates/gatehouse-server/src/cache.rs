//! Single-use credential cache.
//!
//! Authorization codes are random handles resolving to protected ticket
//! blobs stored here. Redemption must consume the entry exactly once even
//! under concurrent attempts, so the contract is built around an atomic
//! `take` rather than a get-then-remove pair.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use gatehouse_core::SystemClock;

/// TTL store keyed by random credential handles.
#[async_trait]
pub trait SingleUseCache: Send + Sync {
    /// Store a blob under a handle. An existing entry under the same
    /// handle is discarded.
    async fn put(&self, handle: String, blob: String, expires_at: DateTime<Utc>);

    /// Atomically fetch and remove the entry for a handle.
    ///
    /// Returns `None` for unknown, expired, and already-taken handles
    /// alike; callers cannot distinguish expiry from reuse.
    async fn take(&self, handle: &str) -> Option<String>;

    /// Drop the entry for a handle, if any.
    async fn remove(&self, handle: &str);
}

struct StoredEntry {
    blob: String,
    expires_at: DateTime<Utc>,
}

/// In-process implementation over a concurrent map.
///
/// Expiry is checked against the injected clock after removal, so an
/// expired entry behaves exactly like an absent one. Expired entries
/// that are never redeemed are purged opportunistically on `put`.
pub struct InMemorySingleUseCache {
    entries: DashMap<String, StoredEntry>,
    clock: Arc<dyn SystemClock>,
}

impl InMemorySingleUseCache {
    /// Create an empty cache reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn SystemClock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of live entries, counting not-yet-purged expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SingleUseCache for InMemorySingleUseCache {
    async fn put(&self, handle: String, blob: String, expires_at: DateTime<Utc>) {
        let now = self.clock.now();
        self.entries.retain(|_, entry| entry.expires_at > now);
        self.entries.insert(handle, StoredEntry { blob, expires_at });
    }

    async fn take(&self, handle: &str) -> Option<String> {
        let (_, entry) = self.entries.remove(handle)?;
        if entry.expires_at <= self.clock.now() {
            return None;
        }
        Some(entry.blob)
    }

    async fn remove(&self, handle: &str) {
        self.entries.remove(handle);
    }
}
