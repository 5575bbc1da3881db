//! Thread-shared cache with a switchable lock-free read path.
//!
//! All access goes through one reader/writer lock by default: any number of
//! `load`s run together, a `store` excludes everything else. Once population
//! is finished a caller can declare that no more stores will happen and let
//! `load` skip the lock entirely.
//!
//! ```text
//!                set_stores_availability(false)
//!   Protected  ------------------------------>  Unprotected
//!   load: read lock                             load: no lock
//!   store: write lock   <----------------------  store: caller's problem
//!                set_stores_availability(true)
//! ```
//!
//! Skipping the lock next to a concurrent write is a data race, so entering
//! unprotected mode and the explicit `*_unprotected` calls are `unsafe`.

use std::{
    cell::UnsafeCell,
    hash::Hash,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU8, Ordering},
        Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
};

use crate::{
    config::CacheConfig, encoding::FixedCodec, error::Result, persist::CacheFile, table::Table,
};

/// How `load` reaches the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Loads take the shared lock.
    Protected,
    /// Loads bypass the lock; no store may run concurrently.
    Unprotected,
}

impl Access {
    fn to_u8(self) -> u8 {
        match self {
            Access::Protected => 0,
            Access::Unprotected => 1,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Access::Unprotected,
            _ => Access::Protected,
        }
    }
}

/// Persistent cache shared between threads.
///
/// ```no_run
/// use std::sync::Arc;
/// use std::thread;
/// use depcache::{deps, ConcurrentCache, Deps};
///
/// let cache: Arc<ConcurrentCache<Deps<(u32,)>, u64>> = Arc::new(ConcurrentCache::open()?);
///
/// let workers: Vec<_> = (0..4u32)
///     .map(|i| {
///         let cache = Arc::clone(&cache);
///         thread::spawn(move || cache.store(deps!(i), u64::from(i) * 2))
///     })
///     .collect();
/// for worker in workers {
///     worker.join().unwrap();
/// }
///
/// // Population is over: reads no longer need the lock.
/// unsafe { cache.set_stores_availability(false) };
/// assert_eq!(cache.load(&deps!(3)), Some(6));
/// # Ok::<(), depcache::Error>(())
/// ```
pub struct ConcurrentCache<K, V>
where
    K: FixedCodec + Eq + Hash,
    V: FixedCodec + Clone,
{
    // Guards `table`; the lock carries no data so loads can bypass it.
    lock: RwLock<()>,
    access: AtomicU8,
    table: UnsafeCell<Table<K, V>>,
    file: Mutex<CacheFile>,
    path: PathBuf,
}

// SAFETY: the table is only touched under `lock`, except on the paths whose
// callers promised (via `unsafe`) that no writer runs concurrently.
unsafe impl<K, V> Send for ConcurrentCache<K, V>
where
    K: FixedCodec + Eq + Hash + Send,
    V: FixedCodec + Clone + Send,
{
}

unsafe impl<K, V> Sync for ConcurrentCache<K, V>
where
    K: FixedCodec + Eq + Hash + Send + Sync,
    V: FixedCodec + Clone + Send + Sync,
{
}

impl<K, V> ConcurrentCache<K, V>
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
        let path = file.path().to_path_buf();

        Ok(Self {
            lock: RwLock::new(()),
            access: AtomicU8::new(Access::Protected.to_u8()),
            table: UnsafeCell::new(table),
            file: Mutex::new(file),
            path,
        })
    }

    // A panic while holding the lock cannot leave the table half-written in a
    // way later readers could observe, so poisoning is ignored.
    fn read_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn access(&self) -> Access {
        Access::from_u8(self.access.load(Ordering::Acquire))
    }

    /// Returns a copy of the value cached under `key`.
    pub fn load(&self, key: &K) -> Option<V> {
        match self.access() {
            // SAFETY: unprotected mode was entered through
            // `set_stores_availability`, whose caller guarantees no store runs
            // concurrently.
            Access::Unprotected => unsafe { self.load_unprotected(key) },
            Access::Protected => {
                let _guard = self.read_guard();
                // SAFETY: shared lock held.
                unsafe { (*self.table.get()).get(key) }
            }
        }
    }

    /// Caches `value` under `key` under the exclusive lock.
    pub fn store(&self, key: K, value: V) {
        let _guard = self.write_guard();
        // SAFETY: exclusive lock held; lock-free readers are excluded by the
        // contract of `set_stores_availability`.
        unsafe { (*self.table.get()).put(key, value) }
    }

    /// `load` without touching the lock.
    ///
    /// # Safety
    ///
    /// No `store` or `store_unprotected` may run concurrently with this call.
    pub unsafe fn load_unprotected(&self, key: &K) -> Option<V> {
        (*self.table.get()).get(key)
    }

    /// `store` without touching the lock.
    ///
    /// # Safety
    ///
    /// The caller must have exclusive access for the duration of the call: no
    /// other load or store of any kind may run concurrently (for example,
    /// single-threaded population before the cache is shared).
    pub unsafe fn store_unprotected(&self, key: K, value: V) {
        (*self.table.get()).put(key, value)
    }

    /// Declares whether stores may still happen.
    ///
    /// Passing `false` switches `load` to the lock-free path; `true` switches
    /// back. The switch itself happens under the exclusive lock.
    ///
    /// # Safety
    ///
    /// After `set_stores_availability(false)` no store of any kind may run
    /// until every load issued in unprotected mode has returned and
    /// `set_stores_availability(true)` has been called.
    pub unsafe fn set_stores_availability(&self, available: bool) {
        let access = if available {
            Access::Protected
        } else {
            Access::Unprotected
        };

        let _guard = self.write_guard();
        let previous = Access::from_u8(self.access.swap(access.to_u8(), Ordering::AcqRel));
        if previous != access {
            tracing::debug!(path = %self.path.display(), ?access, "Switched cache access mode");
        }
    }

    /// Writes the cache file now instead of waiting for drop. Concurrent
    /// stores wait until the snapshot is written.
    pub fn save(&self) -> Result<usize> {
        let _guard = self.read_guard();
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        // SAFETY: shared lock held, so no protected store is running.
        file.save(unsafe { &*self.table.get() })
    }

    pub fn len(&self) -> usize {
        let _guard = self.read_guard();
        // SAFETY: shared lock held.
        unsafe { (*self.table.get()).len() }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// (hits, misses) of `load` since the cache was opened.
    pub fn stats(&self) -> (usize, usize) {
        let _guard = self.read_guard();
        // SAFETY: shared lock held.
        unsafe { (*self.table.get()).stats() }
    }
}

impl<K, V> Drop for ConcurrentCache<K, V>
where
    K: FixedCodec + Eq + Hash,
    V: FixedCodec + Clone,
{
    fn drop(&mut self) {
        let table = self.table.get_mut();
        let file = self.file.get_mut().unwrap_or_else(PoisonError::into_inner);
        file.close(table);
    }
}
