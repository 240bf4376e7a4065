use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self) -> bool {
        if let Some(expires_at) = self.expires_at {
            Instant::now() > expires_at
        } else {
            false
        }
    }
}

/// In-process cache with a single time-to-live for every entry.
///
/// Cloning is cheap; clones share the same store.
#[derive(Debug, Clone)]
pub struct InMemoryCache<K, V>
where
    K: Eq + Hash,
{
    store: Arc<DashMap<K, CacheEntry<V>>>,
    ttl: Option<Duration>,
}

impl<K, V> InMemoryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// A zero TTL disables expiry.
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            ttl: (!ttl.is_zero()).then_some(ttl),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let expired = match self.store.get(key) {
            Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.store.remove(key);
        }
        None
    }

    pub fn insert(&self, key: K, value: V) {
        self.store.insert(key, CacheEntry::new(value, self.ttl));
    }

    pub fn invalidate(&self, key: &K) {
        self.store.remove(key);
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
