//! Storage Module
//!
//! Persistent storage layer built from immutable sorted tables.
//!
//! ## Responsibilities
//! - Persist MemTable contents to disk in sorted binary form
//! - Binary-search lookups and ordered scans over memory-mapped tables
//! - Discover existing tables on startup, skipping corrupt leftovers
//! - Publish new tables atomically (write temp file, then rename)

mod sstable;
mod manager;

pub use sstable::{SSTable, SSTableBuilder, SSTableIter, SSTableMeta, TABLE_EXTENSION, TEMP_EXTENSION};
pub use manager::StorageManager;
