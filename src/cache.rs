//! TTL result cache fronting every acquisition call
//!
//! The engine only consumes the get/set contract; the default backend is an
//! in-process LRU with per-entry deadlines. A remote store (Redis or
//! similar) plugs in by implementing [`ResultCache`] — the engine assumes
//! nothing beyond TTL expiry.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::Mutex;
use tracing::debug;

/// Key/value store with per-entry TTL; values are serialized JSON
#[async_trait]
pub trait ResultCache: Send + Sync {
    /// Fetch a live entry, or None when absent/expired
    async fn get(&self, key: &str) -> Option<String>;

    /// Store an entry, replacing any previous value wholesale
    async fn set(&self, key: &str, value: String, ttl: Duration);
}

/// Default number of entries the in-process cache retains
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// In-process TTL cache backed by an LRU map
///
/// Capacity bounds memory; expiry is checked lazily on read so a stale
/// entry is never served even if it hasn't been evicted yet.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl MemoryCache {
    /// Create a cache retaining at most `capacity` entries
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of entries currently held, expired or not
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Drop every entry
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                debug!(key, "cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!(key, "cache entry expired");
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.lock().await.put(key.to_string(), entry);
    }
}
