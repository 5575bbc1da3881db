use std::{
    collections::{hash_map, HashMap},
    hash::Hash,
    sync::atomic::{AtomicUsize, Ordering},
};

/// In-memory map behind every cache.
///
/// Reads hand out clones so callers never alias stored values. There is no
/// eviction: the table grows until the cache is dropped.
pub struct Table<K, V> {
    entries: HashMap<K, V>,
    stats: Stats,
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Table {
            entries: HashMap::with_capacity(capacity),
            stats: Stats::new(),
        }
    }

    /// Returns a copy of the value stored under `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        match self.entries.get(key) {
            Some(value) => {
                self.stats.hit();
                Some(value.clone())
            }
            None => {
                self.stats.miss();
                None
            }
        }
    }

    /// Inserts `value` under `key`, replacing any previous value.
    pub fn put(&mut self, key: K, value: V) {
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, K, V> {
        self.entries.iter()
    }

    /// (hits, misses) since the table was created.
    pub fn stats(&self) -> (usize, usize) {
        self.stats.get()
    }
}

impl<K, V> Default for Table<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// Atomic so lookups under a shared lock (or no lock at all) can still count.
struct Stats {
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl Stats {
    fn new() -> Self {
        Stats {
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }

    fn miss(&self) {
        self.misses.fetch_add(1, Ordering::SeqCst);
    }

    fn get(&self) -> (usize, usize) {
        (
            self.hits.load(Ordering::SeqCst),
            self.misses.load(Ordering::SeqCst),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{deps, Deps};

    #[test]
    fn test_put_and_get() {
        let mut table = Table::new();

        table.put(deps!(1, 4.6), 1.5f64);
        table.put(deps!(2, 4.6), 2.5f64);

        assert_eq!(table.get(&deps!(1, 4.6)), Some(1.5));
        assert_eq!(table.get(&deps!(2, 4.6)), Some(2.5));
        assert_eq!(table.get(&deps!(3, 4.6)), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_put_overwrites() {
        let mut table = Table::new();

        table.put(deps!(1u8), 10u32);
        table.put(deps!(1u8), 20u32);

        assert_eq!(table.get(&deps!(1u8)), Some(20));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_get_returns_a_copy() {
        let mut table: Table<Deps<(u8,)>, [u32; 2]> = Table::new();
        table.put(deps!(1u8), [1, 2]);

        let mut copy = table.get(&deps!(1u8)).unwrap();
        copy[0] = 99;

        assert_eq!(table.get(&deps!(1u8)), Some([1, 2]));
    }

    #[test]
    fn test_hit_ratio() {
        let cap = 10u32;
        let mut table = Table::with_capacity(cap as usize);

        for i in 0..cap {
            table.put(deps!(i), i);
        }

        for i in 0..cap {
            assert_eq!(table.get(&deps!(i)), Some(i));
        }
        assert_eq!(table.get(&deps!(cap)), None);

        let (hits, misses) = table.stats();
        assert_eq!(hits, cap as usize);
        assert_eq!(misses, 1);
    }

    #[test]
    fn test_empty_table() {
        let table: Table<Deps<(i32,)>, f64> = Table::default();
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
    }
}
