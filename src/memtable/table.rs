//! MemTable implementation
//!
//! BTreeMap-based memtable keyed by the row key.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::clock::TimestampSource;
use crate::error::Result;
use crate::iterator::RowSource;
use crate::row::Row;
use crate::table::Table;

use super::MemTableIter;

/// In-memory table for recent writes
///
/// The map is shared copy-on-write with open iterators: a write clones it
/// only while an iterator still holds the previous version.
#[derive(Debug, Clone)]
pub struct MemTable {
    /// Sorted rows, one per key
    rows: Arc<BTreeMap<Bytes, Row>>,

    /// Sum of `Row::size_bytes` over every resident row
    size_bytes: u64,

    /// Stamps every write
    clock: Arc<TimestampSource>,
}

impl MemTable {
    /// Create a new empty MemTable driven by the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(TimestampSource::system()))
    }

    /// Create a new empty MemTable stamping writes from `clock`
    pub fn with_clock(clock: Arc<TimestampSource>) -> Self {
        Self {
            rows: Arc::new(BTreeMap::new()),
            size_bytes: 0,
            clock,
        }
    }

    /// Insert or replace a live value
    pub fn upsert(&mut self, key: Bytes, value: Bytes) {
        let row = Row::data(key, value, self.clock.next());
        self.insert(row);
    }

    /// Insert or replace with a tombstone
    pub fn remove(&mut self, key: Bytes) {
        let row = Row::tombstone(key, self.clock.next());
        self.insert(row);
    }

    fn insert(&mut self, row: Row) {
        let added = row.size_bytes();
        match Arc::make_mut(&mut self.rows).insert(row.key.clone(), row) {
            // Same key on both sides, so only the value sizes differ
            Some(previous) => {
                self.size_bytes = self.size_bytes - previous.size_bytes() + added;
            }
            None => self.size_bytes += added,
        }
    }

    /// Row currently stored for `key`, tombstones included
    pub fn get(&self, key: &[u8]) -> Option<&Row> {
        self.rows.get(key)
    }

    /// Rows with key >= `from`, ascending, over a snapshot of the
    /// current contents
    pub fn iter_from(&self, from: &[u8]) -> MemTableIter {
        MemTableIter::new(Arc::clone(&self.rows), from)
    }

    /// Every row in ascending key order (for flush)
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    /// Serialized footprint of all resident rows
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Hand off the current contents, leaving an empty table with size 0
    /// that keeps stamping from the same clock.
    pub fn take(&mut self) -> MemTable {
        let fresh = MemTable::with_clock(Arc::clone(&self.clock));
        std::mem::replace(self, fresh)
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Table for MemTable {
    fn iter_from(&self, from: &[u8]) -> RowSource {
        Box::new(MemTable::iter_from(self, from))
    }

    fn upsert(&mut self, key: Bytes, value: Bytes) -> Result<()> {
        MemTable::upsert(self, key, value);
        Ok(())
    }

    fn remove(&mut self, key: Bytes) -> Result<()> {
        MemTable::remove(self, key);
        Ok(())
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}
