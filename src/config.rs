use std::path::PathBuf;

/// Configuration for a cache instance.
///
/// The cache file name itself is always derived from the key and value shapes
/// (plus the tag); only the directory it lives in is configurable.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding the cache file (default: current directory)
    pub dir: PathBuf,

    /// Extra discriminator so caches with identical shapes can coexist
    /// (default: none)
    pub tag: Option<String>,

    /// Hold an advisory lock on `<cache file>.lock` while the cache is open
    /// (default: false)
    pub lock_file: bool,

    /// fsync the cache file after every save (default: false)
    pub sync_on_save: bool,

    /// Initial table capacity (default: 0)
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            tag: None,
            lock_file: false,
            sync_on_save: false,
            capacity: 0,
        }
    }
}

impl CacheConfig {
    /// Create a new config with the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    /// Set the tag mixed into the file name
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Enable the advisory lock file
    pub fn lock_file(mut self, enabled: bool) -> Self {
        self.lock_file = enabled;
        self
    }

    /// fsync after each save
    pub fn sync_on_save(mut self, enabled: bool) -> Self {
        self.sync_on_save = enabled;
        self
    }

    /// Set initial table capacity
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}
