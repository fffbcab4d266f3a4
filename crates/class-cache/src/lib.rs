//! # Class Cache
//!
//! Persistence for the class discovery graph.
//!
//! This crate provides:
//! - The cache root directory layout (snapshots and logs)
//! - The serialized snapshot of a class registry and its inheritance map
//! - A store that loads, saves, invalidates and wipes snapshots per cache key
//!
//! A snapshot is only returned when its cache key, framework version and
//! scanned path list all match the caller's; anything else is a miss and the
//! caller rebuilds from source.

pub mod cache_directory;
pub mod errors;
pub mod snapshot;
pub mod store;

pub use cache_directory::CacheDirectory;
pub use errors::{CacheError, Result};
pub use snapshot::{CacheKey, CacheSnapshot, CachedEntry};
pub use store::SnapshotStore;
