//! Disk-persisted memoization cache.
//!
//! Results of expensive computations are stored under a key built from the
//! computation's inputs ([`Deps`]) and written to a binary file named after the
//! key and value types. The next process opening a cache of the same types
//! picks the results back up.

pub mod cache;
pub mod concurrent;
pub mod config;
pub mod deps;
pub mod encoding;
pub mod error;
pub mod flock;
pub mod hasher;
pub mod persist;
pub mod table;

pub use cache::Cache;
pub use concurrent::{Access, ConcurrentCache};
pub use config::CacheConfig;
pub use deps::{Deps, Slot, Slots};
pub use encoding::FixedCodec;
pub use error::{Error, Result};
