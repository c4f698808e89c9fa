//! Bounded entry cache with least-recently-used eviction.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::unit::EntryPoint;

/// Fingerprint to entry point map holding at most `capacity` entries.
///
/// Entries are ordered from least to most recently used; a hit moves the
/// entry to the back, an insert beyond capacity evicts from the front.
#[derive(Debug)]
pub struct EntryCache {
    capacity: usize,
    entries: Mutex<IndexMap<String, Arc<dyn EntryPoint>>>,
}

impl EntryCache {
    /// Creates a cache; a capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(IndexMap::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the entry and marks it most recently used.
    pub fn get(&self, fingerprint: &str) -> Option<Arc<dyn EntryPoint>> {
        let mut entries = self.entries.lock();
        let entry = entries.shift_remove(fingerprint)?;
        entries.insert(fingerprint.to_string(), Arc::clone(&entry));
        Some(entry)
    }

    /// Caches `entry` unless another caller cached one first, and returns
    /// the cached winner.
    pub fn insert(&self, fingerprint: &str, entry: Arc<dyn EntryPoint>) -> Arc<dyn EntryPoint> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(fingerprint) {
            return Arc::clone(existing);
        }
        while entries.len() >= self.capacity {
            if let Some((evicted, _)) = entries.shift_remove_index(0) {
                debug!(fingerprint = %evicted, "Entry evicted");
            }
        }
        entries.insert(fingerprint.to_string(), Arc::clone(&entry));
        entry
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.entries.lock().contains_key(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use crate::unit::InterpretedOperation;
    use querygen_core::Types;

    fn entry(n: i64) -> Arc<dyn EntryPoint> {
        Arc::new(InterpretedOperation::new("eval", Expr::long(n), 0, Types::long()))
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = EntryCache::new(2);
        cache.insert("a", entry(1));
        cache.insert("b", entry(2));
        assert!(cache.get("a").is_some());

        cache.insert("c", entry(3));

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = EntryCache::new(4);
        let first = cache.insert("a", entry(1));
        let second = cache.insert("a", entry(2));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            cache.get("a").unwrap().invoke(&[]).unwrap(),
            crate::value::Value::Long(1)
        );
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache = EntryCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert("a", entry(1));
        cache.insert("b", entry(2));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("b"));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_inserts() {
        let cache = Arc::new(EntryCache::new(8));
        std::thread::scope(|scope| {
            for t in 0..4 {
                let cache = Arc::clone(&cache);
                scope.spawn(move || {
                    for i in 0..32 {
                        let key = format!("k{}", (i + t) % 12);
                        if cache.get(&key).is_none() {
                            cache.insert(&key, entry(i));
                        }
                    }
                });
            }
        });
        assert_eq!(cache.len(), 8);
    }
}
