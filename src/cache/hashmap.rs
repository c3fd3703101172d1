//! HashMap-based memo store.
//!
//! Entries are never evicted: a store lives as long as one
//! [`Engine`][crate::engine::Engine] and is dropped with it.

use std::collections::HashMap;
use std::hash::Hash;

/// A memo table backed by [HashMap], counting lookups.
#[derive(Debug, Clone)]
pub struct HashMapCache<K, V> {
    map: HashMap<K, V>,
    hits: usize,
    misses: usize,
}

impl<K, V> Default for HashMapCache<K, V> {
    fn default() -> Self {
        Self::new(10)
    }
}

impl<K, V> HashMapCache<K, V> {
    /// Creates a new cache with room for `2^bits` entries.
    pub fn new(bits: usize) -> Self {
        Self::with_capacity(1 << bits)
    }

    /// Creates a new cache with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Returns the number of entries in the cache.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the number of cache hits.
    pub fn hits(&self) -> usize {
        self.hits
    }

    /// Returns the number of cache misses.
    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Iterates over all entries, in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.map.iter()
    }

    /// Clears all entries and counters.
    pub fn clear(&mut self) {
        self.map.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

impl<K, V> HashMapCache<K, V>
where
    K: Hash + Eq,
{
    /// Looks up a key in the cache.
    #[inline]
    pub fn get(&mut self, key: &K) -> Option<&V> {
        match self.map.get(key) {
            Some(v) => {
                self.hits += 1;
                Some(v)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Checks for a key without touching the counters.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Inserts a key-value pair into the cache.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) {
        self.map.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_cache_basic() {
        let mut cache = HashMapCache::<(u64, u64), String>::new(4);

        cache.insert((1, 2), "a".to_string());
        cache.insert((3, 4), "b".to_string());

        assert_eq!(cache.get(&(1, 2)).map(String::as_str), Some("a"));
        assert_eq!(cache.get(&(3, 4)).map(String::as_str), Some("b"));
        assert_eq!(cache.get(&(5, 6)), None);

        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_hashmap_cache_contains_does_not_count() {
        let mut cache = HashMapCache::<u64, i32>::new(2);
        cache.insert(7, 42);
        assert!(cache.contains(&7));
        assert!(!cache.contains(&8));
        assert_eq!(cache.hits() + cache.misses(), 0);
    }

    #[test]
    fn test_hashmap_cache_clear() {
        let mut cache = HashMapCache::<(u64, u64), i32>::new(4);

        cache.insert((1, 2), 42);
        assert_eq!(cache.get(&(1, 2)), Some(&42));

        cache.clear();
        assert_eq!(cache.get(&(1, 2)), None);
        assert!(cache.is_empty());
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_hashmap_cache_grows() {
        let mut cache = HashMapCache::<(u64, u64), i32>::new(2);

        for i in 0..1000 {
            cache.insert((i, 0), i as i32);
        }

        for i in 0..1000 {
            assert_eq!(cache.get(&(i, 0)), Some(&(i as i32)));
        }

        assert_eq!(cache.len(), 1000);
        assert_eq!(cache.iter().count(), 1000);
    }
}
