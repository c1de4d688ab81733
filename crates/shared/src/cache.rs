use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

/// In-memory cache owned by the service that fills it.
///
/// Entries expire after `ttl`; [`TtlCache::clear`] drops them early.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        match entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, (Instant::now(), value));
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;

    use super::*;

    #[test]
    fn returns_fresh_values() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert(1, "admin");

        assert_eq!(cache.get(&1), Some("admin"));
        assert_eq!(cache.get(&2), None);
    }

    #[test]
    fn expired_values_are_dropped() {
        let cache = TtlCache::new(Duration::from_millis(10));
        cache.insert("houses", vec![1, 2]);
        sleep(Duration::from_millis(30));

        assert_eq!(cache.get(&"houses"), None);
    }

    #[test]
    fn clear_drops_every_entry() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert(1, true);
        cache.insert(2, false);

        cache.clear();
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), None);
    }
}
