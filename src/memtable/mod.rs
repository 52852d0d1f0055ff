//! MemTable Module
//!
//! In-memory buffer for the most recent writes.
//!
//! ## Responsibilities
//! - Last write wins per key (upsert and remove both replace)
//! - Exact serialized-size accounting for flush triggers
//! - Ordered iteration from any key for reads and flushes
//!
//! ## Data Structure Choice
//! Using a BTreeMap behind an `Arc`:
//! - Ordered keys (required for SSTable generation)
//! - `range` gives the tail view needed by `iter_from`
//! - Readers iterate a shared snapshot after releasing the engine lock;
//!   writers clone the map only if such a snapshot is still alive
//! - Synchronization lives in the engine, which swaps whole tables on flush

mod iterator;
mod table;

pub use iterator::MemTableIter;
pub use table::MemTable;
