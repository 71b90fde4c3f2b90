use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_millis(60_000);

/// Time source for cache expiry, injected so tests can advance it manually.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Clone)]
pub struct CacheEntry {
    pub data: Value,
    pub expires_at: Instant,
}

/// Response cache keyed by request URL. Entries live for a fixed TTL and are
/// evicted lazily on the first lookup after expiry.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Box<dyn Clock>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Box::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Box<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn get(&self, url: &str) -> Option<Value> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get(url) {
            if now < entry.expires_at {
                return Some(entry.data.clone());
            }
            entries.remove(url);
        }
        None
    }

    /// Inserts or overwrites the entry for `url`, valid for one TTL from now.
    pub fn insert(&self, url: &str, data: Value) {
        let expires_at = self.clock.now() + self.ttl;
        let mut entries = self.entries.lock().unwrap();
        entries.insert(url.to_string(), CacheEntry { data, expires_at });
    }

    /// Drops every expired entry. `get` already evicts lazily; this bounds the
    /// map for callers that touch many distinct URLs between lookups.
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, entry| now < entry.expires_at);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
