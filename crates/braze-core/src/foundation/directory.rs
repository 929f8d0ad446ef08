//! Channel directory for the Braze framework.
//!
//! The [`ChannelDirectory`] caches the mapping from a normalized channel name
//! to the opaque channel identifier the platform assigned, so handlers can
//! address channels by name without manual ID lookups.
//!
//! Names are normalized by hex-encoding their UTF-8 bytes. The encoding is
//! deterministic and collision-free; consumers never need to reverse it, it
//! only serves as a stable key.
//!
//! # Lifecycle
//!
//! The directory starts empty, is optionally hydrated once from a
//! [`DirectoryStore`], grows lazily as messages are observed, and is replaced
//! wholesale on channel lifecycle events. It lives for the process lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::foundation::error::StoreResult;
use crate::foundation::event::ChannelInfo;

/// Persistence seam for the channel directory.
///
/// Both operations are best-effort from the directory's point of view:
/// a failing `save` is logged and swallowed, a failing `load` leaves the
/// directory empty. A broken store must never break dispatch.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Persists the full mapping.
    async fn save(&self, entries: &HashMap<String, String>) -> StoreResult<()>;

    /// Loads the previously persisted mapping.
    async fn load(&self) -> StoreResult<HashMap<String, String>>;
}

/// Cache mapping normalized channel names to channel identifiers.
///
/// # Concurrency
///
/// The directory is shared by all concurrent dispatches. Reads never block
/// each other; writes ([`remember_if_absent`](Self::remember_if_absent),
/// [`rebuild`](Self::rebuild)) are applied atomically relative to reads via
/// an interior `RwLock`.
pub struct ChannelDirectory {
    /// normalized name -> channel id
    entries: RwLock<HashMap<String, String>>,
    /// Optional persistence hook.
    store: Option<Arc<dyn DirectoryStore>>,
}

impl ChannelDirectory {
    /// Creates an empty directory with no persistence.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            store: None,
        }
    }

    /// Creates an empty directory backed by the given store.
    pub fn with_store(store: Arc<dyn DirectoryStore>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            store: Some(store),
        }
    }

    /// Normalizes a channel name into its stable map key.
    fn normalize(name: &str) -> String {
        hex::encode(name.as_bytes())
    }

    /// Looks up the identifier cached for `name`.
    ///
    /// Never blocks on I/O, never fails.
    pub fn lookup(&self, name: &str) -> Option<String> {
        self.entries.read().get(&Self::normalize(name)).cloned()
    }

    /// Inserts `name -> id` if no entry exists for `name` yet.
    ///
    /// Insertion is first-write-wins: an existing entry is never overwritten
    /// outside of a full [`rebuild`](Self::rebuild). On an actual insert with
    /// a store configured, the full mapping is persisted asynchronously;
    /// persistence failures are logged, never propagated.
    pub fn remember_if_absent(&self, name: &str, id: &str) {
        let key = Self::normalize(name);
        let snapshot = {
            let mut entries = self.entries.write();
            if entries.contains_key(&key) {
                return;
            }
            entries.insert(key, id.to_string());
            self.store.as_ref().map(|_| (*entries).clone())
        };

        if let (Some(store), Some(snapshot)) = (self.store.clone(), snapshot) {
            tokio::spawn(async move {
                if let Err(e) = store.save(&snapshot).await {
                    warn!(error = %e, "failed to persist channel directory");
                }
            });
        }
    }

    /// Replaces the entire mapping from a live channel enumeration.
    ///
    /// Only text-capable channels are entered. Prior entries are discarded,
    /// which handles renames and deletions without stale entries. The swap is
    /// atomic relative to concurrent reads.
    pub fn rebuild(&self, channels: &[ChannelInfo]) {
        let next: HashMap<String, String> = channels
            .iter()
            .filter(|c| c.kind.is_text())
            .map(|c| (Self::normalize(&c.name), c.id.clone()))
            .collect();
        let count = next.len();
        *self.entries.write() = next;
        debug!(channels = count, "channel directory rebuilt");
    }

    /// One-shot hydration from the configured store.
    ///
    /// A load failure (or the absence of a store) leaves the directory empty.
    pub async fn hydrate(&self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        match store.load().await {
            Ok(entries) => {
                let count = entries.len();
                *self.entries.write() = entries;
                debug!(channels = count, "channel directory hydrated");
            }
            Err(e) => {
                warn!(error = %e, "failed to load channel directory, starting empty");
            }
        }
    }

    /// Returns a copy of the current mapping.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries.read().clone()
    }

    /// Returns the number of cached channels.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if no channels are cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for ChannelDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChannelDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelDirectory")
            .field("len", &self.len())
            .field("has_store", &self.store.is_some())
            .finish()
    }
}
