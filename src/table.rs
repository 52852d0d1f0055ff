//! Table Trait
//!
//! The sorted-table capability shared by the mutable MemTable and the
//! immutable SSTable. The engine merges both through this interface.

use bytes::Bytes;

use crate::error::Result;
use crate::iterator::RowSource;

/// A sorted table of rows, de-duplicated within itself
pub trait Table {
    /// Rows with key >= `from`, in ascending key order.
    ///
    /// The source owns whatever it reads from, so it stays valid after the
    /// caller lets go of the table (and of any lock guarding it).
    fn iter_from(&self, from: &[u8]) -> RowSource;

    /// Insert or replace the value for `key`
    fn upsert(&mut self, key: Bytes, value: Bytes) -> Result<()>;

    /// Record a tombstone for `key`
    fn remove(&mut self, key: Bytes) -> Result<()>;

    /// Number of rows held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
