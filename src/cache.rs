use std::{hash::Hash, path::Path};

use crate::{
    config::CacheConfig, encoding::FixedCodec, error::Result, persist::CacheFile, table::Table,
};

/// Single-owner persistent cache.
///
/// Loads its file on open and writes it back when dropped. Not synchronized;
/// share a [`ConcurrentCache`](crate::ConcurrentCache) between threads
/// instead.
///
/// ```no_run
/// use depcache::{deps, Cache, Deps};
///
/// let mut cache: Cache<Deps<(i32, f64)>, f64> = Cache::open()?;
/// let key = deps!(1, 4.6);
/// let value = match cache.load(&key) {
///     Some(value) => value,
///     None => {
///         let value = 1.0 + 4.6; // expensive computation
///         cache.store(key, value);
///         value
///     }
/// };
/// # let _ = value;
/// # Ok::<(), depcache::Error>(())
/// ```
pub struct Cache<K, V>
where
    K: FixedCodec + Eq + Hash,
    V: FixedCodec + Clone,
{
    table: Table<K, V>,
    file: CacheFile,
}

impl<K, V> Cache<K, V>
where
    K: FixedCodec + Eq + Hash,
    V: FixedCodec + Clone,
{
    /// Open the cache in the current directory with default configuration
    pub fn open() -> Result<Self> {
        Self::open_with_config(CacheConfig::default())
    }

    /// Open the cache with custom configuration
    pub fn open_with_config(config: CacheConfig) -> Result<Self> {
        K::validate()?;
        V::validate()?;

        let mut file = CacheFile::open::<K, V>(&config)?;
        let table = file.load(config.capacity);

        Ok(Self { table, file })
    }

    /// Returns a copy of the value cached under `key`.
    pub fn load(&self, key: &K) -> Option<V> {
        self.table.get(key)
    }

    /// Caches `value` under `key`, replacing any previous value.
    pub fn store(&mut self, key: K, value: V) {
        self.table.put(key, value);
    }

    /// Writes the cache file now instead of waiting for drop.
    pub fn save(&mut self) -> Result<usize> {
        self.file.save(&self.table)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// (hits, misses) of `load` since the cache was opened.
    pub fn stats(&self) -> (usize, usize) {
        self.table.stats()
    }
}

impl<K, V> Drop for Cache<K, V>
where
    K: FixedCodec + Eq + Hash,
    V: FixedCodec + Clone,
{
    fn drop(&mut self) {
        self.file.close(&self.table);
    }
}
