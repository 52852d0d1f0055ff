//! # PolarKV
//!
//! A log-structured merge key-value storage engine with:
//! - A sorted in-memory write buffer (MemTable) with exact size accounting
//! - Immutable, memory-mapped, binary sorted tables (SSTables)
//! - Merge-sorted reads across every generation with newest-wins resolution
//! - Single-writer/multi-reader concurrency model
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Engine                              │
//! │            (Single Writer / Multi Reader, RwLock)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │ writes                  │ reads
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────────┐
//!   │  MemTable   │─ flush ─▶│ StorageManager   │
//!   │ (BTreeMap)  │          │ SSTables (mmap)  │
//!   └──────┬──────┘          └────────┬─────────┘
//!          │                          │
//!          └──────────┬───────────────┘
//!                     ▼
//!           ┌───────────────────┐
//!           │  MergeIterator    │
//!           │ collapse + filter │
//!           └───────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod clock;
pub mod row;
pub mod table;
pub mod memtable;
pub mod storage;
pub mod iterator;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{PolarError, Result};
pub use config::Config;
pub use engine::Engine;
pub use row::{Record, Row, Value};
pub use table::Table;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of PolarKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
