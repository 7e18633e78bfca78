//! Sliding-expiration keyed cache.
//!
//! A small concurrent map where every read of an entry pushes its
//! expiration forward by the configured lifetime. Expiry is lazy: entries
//! are dropped when a read finds them stale, and stale entries are purged
//! opportunistically on insert. There is no background sweep.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// A keyed cache with sliding expiration.
///
/// All operations are per-key atomic behind an interior mutex; readers
/// and writers from many in-flight requests may interleave freely.
pub struct ExpiringCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> ExpiringCache<V> {
    /// Create a cache whose entries live `ttl` past their last access.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Insert or replace the entry for `key`, resetting its expiration.
    ///
    /// Stale entries are purged while the lock is held.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let now = Instant::now();
        let mut entries = self.lock();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.into(),
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Read the entry for `key`, sliding its expiration forward.
    ///
    /// Returns `None` for missing or expired entries; an expired entry is
    /// removed on discovery.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.lock();
        match entries.get_mut(key) {
            Some(entry) if entry.expires_at > now => {
                entry.expires_at = now + self.ttl;
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Remove and return the entry for `key`, if present and unexpired.
    pub fn take(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.lock();
        let entry = entries.remove(key)?;
        (entry.expires_at > now).then_some(entry.value)
    }

    /// Remove the entry for `key`, if present.
    pub fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Number of entries, counting not-yet-purged expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry<V>>> {
        // A poisoned lock only means another thread panicked mid-operation;
        // the map itself is still usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
