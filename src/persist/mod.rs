//! Loading and saving the cache file.
//!
//! A cache file is read once when a cache is opened and rewritten in full when
//! it is saved or dropped:
//!
//! ```text
//! Uninitialized -> Loading -> Ready -> Saving -> Closed
//!                               ^        |
//!                               +--------+   (explicit save)
//! ```
//!
//! Loading is forgiving: a missing, empty, unreadable or undecodable file
//! yields an empty table, and a trailing partial record is dropped. Saving
//! truncates the previous contents. Failures during the final save on drop
//! are logged and swallowed so losing the cache never takes the host process
//! down with it.

pub mod naming;
pub mod record;

use std::fs::{self, File};
use std::hash::Hash;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::config::CacheConfig;
use crate::encoding::FixedCodec;
use crate::error::Result;
use crate::flock::FileLock;
use crate::table::Table;
use crate::Error;

use record::Layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
    Saving,
    Closed,
}

/// Owner of a cache file on disk.
#[derive(Debug)]
pub struct CacheFile {
    path: PathBuf,
    layout: Layout,
    sync_on_save: bool,
    phase: Phase,
    _lock: Option<FileLock>,
}

impl CacheFile {
    /// Resolves the file path for `K`/`V` and, if configured, takes the
    /// advisory lock. Does not touch the cache file itself.
    pub fn open<K: FixedCodec, V: FixedCodec>(config: &CacheConfig) -> Result<Self> {
        let path = config
            .dir
            .join(naming::file_name::<K, V>(config.tag.as_deref()));

        let lock = if config.lock_file {
            fs::create_dir_all(&config.dir)?;
            let lock = FileLock::lock(FileLock::path_for(&path)).map_err(Error::LockError)?;
            Some(lock)
        } else {
            None
        };

        Ok(Self {
            path,
            layout: Layout::of::<K, V>(),
            sync_on_save: config.sync_on_save,
            phase: Phase::Loading,
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Reads the cache file into a fresh table. Never fails; anything that
    /// prevents reading the file leaves the table empty.
    pub fn load<K, V>(&mut self, capacity: usize) -> Table<K, V>
    where
        K: FixedCodec + Eq + Hash,
        V: FixedCodec + Clone,
    {
        let table = match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Table::with_capacity(capacity),
            Ok(bytes) => self.decode(&bytes, capacity),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No cache file, starting empty");
                Table::with_capacity(capacity)
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to read cache file, starting empty"
                );
                Table::with_capacity(capacity)
            }
        };

        self.phase = Phase::Ready;
        table
    }

    fn decode<K, V>(&self, bytes: &[u8], capacity: usize) -> Table<K, V>
    where
        K: FixedCodec + Eq + Hash,
        V: FixedCodec + Clone,
    {
        let trailing = self.layout.trailing(bytes.len());
        if trailing != 0 {
            tracing::warn!(
                path = %self.path.display(),
                trailing_bytes = trailing,
                record_size = self.layout.record_size(),
                "Cache file ends with a partial record, ignoring it"
            );
        }

        let expected = self.layout.record_count(bytes.len());
        let mut table = Table::with_capacity(capacity.max(expected));
        match record::decode_into(bytes, &mut table) {
            Ok(records) => {
                tracing::info!(path = %self.path.display(), records, "Loaded cache file");
                table
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Cache file is unreadable, starting empty"
                );
                Table::with_capacity(capacity)
            }
        }
    }

    /// Rewrites the cache file with the contents of `table`. Returns the
    /// number of records written.
    pub fn save<K, V>(&mut self, table: &Table<K, V>) -> Result<usize>
    where
        K: FixedCodec + Eq + Hash,
        V: FixedCodec + Clone,
    {
        if self.phase == Phase::Closed {
            return Err(Error::IoError(std::io::Error::new(
                ErrorKind::Other,
                "cache file already closed",
            )));
        }

        self.phase = Phase::Saving;
        let result = self.write(table);
        self.phase = Phase::Ready;
        result
    }

    fn write<K, V>(&self, table: &Table<K, V>) -> Result<usize>
    where
        K: FixedCodec + Eq + Hash,
        V: FixedCodec + Clone,
    {
        let (buf, records) = record::encode_table(table);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(&buf)?;
        file.flush()?;
        if self.sync_on_save {
            file.sync_all()?;
        }

        tracing::debug!(
            path = %self.path.display(),
            records,
            bytes = buf.len(),
            "Saved cache file"
        );
        Ok(records)
    }

    /// Final save on teardown. Errors are logged, never returned.
    pub fn close<K, V>(&mut self, table: &Table<K, V>)
    where
        K: FixedCodec + Eq + Hash,
        V: FixedCodec + Clone,
    {
        if self.phase == Phase::Closed {
            return;
        }

        if let Err(e) = self.save(table) {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Failed to save cache file, contents are lost"
            );
        }

        self.phase = Phase::Closed;
        self._lock = None;
    }
}
