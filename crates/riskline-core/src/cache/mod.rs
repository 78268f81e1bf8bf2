//! In-memory TTL cache used to rate-limit remote syncs and reuse per-file
//! risk lists within a session.
//!
//! Entries expire on read; nothing is persisted and nothing survives the
//! process. Instances are owned by the composition root and passed in,
//! never stored as module-level state.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    default_ttl: Duration,
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Returns the cached value if present and not yet expired.
    /// An expired entry is removed on the way out.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key,
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key).map(|e| e.value)
    }

    /// Number of entries currently stored, including any not yet reaped.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        cache.set("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"b".to_string()), None);
    }

    #[test]
    fn test_expiry() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_millis(10));
        cache.set("a".to_string(), 1);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get(&"a".to_string()), None);
        // The expired entry was reaped by the failed get.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_overwrite_resets_ttl() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_millis(30));
        cache.set("a".to_string(), 1);
        std::thread::sleep(Duration::from_millis(20));
        cache.set("a".to_string(), 2);
        std::thread::sleep(Duration::from_millis(20));
        // 40ms after the first insert, but only 20ms after the overwrite.
        assert_eq!(cache.get(&"a".to_string()), Some(2));
    }

    #[test]
    fn test_explicit_ttl_beats_default() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_millis(5));
        cache.set_with_ttl("a".to_string(), 1, Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(15));
        assert_eq!(cache.get(&"a".to_string()), Some(1));
    }

    #[test]
    fn test_remove() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        cache.set("a".to_string(), 1);
        assert_eq!(cache.remove(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"a".to_string()), None);
    }
}
