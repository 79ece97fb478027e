use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
}

/// In-memory memoization of collaborator responses, keyed by a deterministic
/// string built from the call identity and its arguments. Entries past their
/// TTL are treated as absent and evicted lazily on the next lookup.
///
/// The cache does not distinguish success from a cached error value; callers
/// that must not cache failures keep the cache inside their error handling.
pub struct ApiCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> ApiCache<T> {
    pub fn new(ttl: Duration) -> Self {
        ApiCache {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Deterministic cache key: function identity plus its arguments in order.
    pub fn key(function: &str, args: &[&str]) -> String {
        let mut parts = vec![function];
        parts.extend_from_slice(args);
        parts.join("|")
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() <= self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                log::debug!("Cache entry expired for key {}", key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: &str, value: T) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}
