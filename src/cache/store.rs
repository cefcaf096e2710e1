//! Page Store Module
//!
//! Storage contract for serialized entries, an in-memory backend, and the
//! `PageCache` front that loads and persists entries through it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{PageCacheEntry, PageCacheStats, MAX_ENTRY_SIZE, MAX_KEY_LENGTH};
use crate::error::{PageCacheError, Result};

// == Storage Contract ==
/// Key/value storage for serialized entries. Last write wins.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Returns the serialized entry stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// Stores a serialized entry under `key`, replacing any previous one.
    async fn store(&self, key: &str, serialized: String) -> Result<()>;
}

// == Memory Page Store ==
/// In-process page store. Entries live until overwritten.
///
/// With a page limit set, storing a new key into a full store fails instead
/// of evicting; overwrites are always accepted.
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    entries: RwLock<HashMap<String, String>>,
    max_pages: Option<usize>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that holds at most `max_pages` keys.
    pub fn with_max_pages(max_pages: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_pages: Some(max_pages),
        }
    }

    /// Returns the current number of stored pages.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn store(&self, key: &str, serialized: String) -> Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(PageCacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        if serialized.len() > MAX_ENTRY_SIZE {
            return Err(PageCacheError::InvalidRequest(format!(
                "Entry exceeds maximum size of {} bytes",
                MAX_ENTRY_SIZE
            )));
        }

        let mut entries = self.entries.write().await;
        if let Some(max_pages) = self.max_pages {
            if entries.len() >= max_pages && !entries.contains_key(key) {
                return Err(PageCacheError::Storage(format!(
                    "Store is full ({} pages)",
                    max_pages
                )));
            }
        }

        entries.insert(key.to_string(), serialized);
        Ok(())
    }
}

// == Page Cache ==
/// Loads and persists entries through a `PageStore`, keeping statistics.
pub struct PageCache {
    store: Arc<dyn PageStore>,
    stats: RwLock<PageCacheStats>,
}

impl PageCache {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self {
            store,
            stats: RwLock::new(PageCacheStats::new()),
        }
    }

    // == Load ==
    /// Loads the entry for `key`. A miss yields an entry that does not exist.
    pub async fn load(&self, key: &str) -> Result<PageCacheEntry> {
        let serialized = self.store.load(key).await?;
        let entry = PageCacheEntry::from_serialized(serialized.as_deref());

        let mut stats = self.stats.write().await;
        if entry.exists() {
            stats.record_hit();
        } else {
            stats.record_miss();
        }

        Ok(entry)
    }

    // == Persist ==
    /// Stores `entry` under `key` unless it is invalid.
    ///
    /// Returns whether the entry was written.
    pub async fn persist(&self, key: &str, entry: &PageCacheEntry) -> Result<bool> {
        if !entry.is_valid() {
            info!(key, "Page has undescribable hook parameters, not caching");
            self.stats.write().await.record_rejected();
            return Ok(false);
        }

        self.store.store(key, entry.serialize()?).await?;
        debug!(key, hooks = entry.hooks().len(), "Page cached");
        self.stats.write().await.record_stored();
        Ok(true)
    }

    // == Raw ==
    /// Returns the stored record as-is.
    pub async fn raw(&self, key: &str) -> Result<Option<String>> {
        self.store.load(key).await
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> PageCacheStats {
        self.stats.read().await.clone()
    }
}
