// src/infrastructure/cache/mod.rs
// In-memory TTL cache shared by the exchange adapters

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry<V> {
    expires_at: Instant,
    value: V,
}

/// Key/value store with a per-entry absolute expiry.
///
/// Expired entries are removed lazily by the read that finds them; there is
/// no background sweeper. `get` hands out clones, so the lock is never held
/// across an await.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store `value` until `now + ttl`, replacing any previous entry.
    pub fn set(&self, key: &str, ttl: Duration, value: V) {
        let entry = Entry {
            expires_at: Instant::now() + ttl,
            value,
        };
        self.lock().insert(key.to_string(), entry);
    }

    /// Live value for `key`, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();

        match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                log::trace!("cache entry {} expired", key);
                None
            }
            None => None,
        }
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
        // Map writes are single inserts or removes; a poisoned map is still valid.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
