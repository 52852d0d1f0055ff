//! SSTable Module
//!
//! Sorted String Table - immutable on-disk sorted key-value storage.
//!
//! ## File Format (big-endian integers throughout)
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Rows (variable), in ascending key order                 │
//! │   [KeyLen: u32][Key][Timestamp: i64][ValLen: u32][Val]  │
//! │   Timestamp < 0 means tombstone: |Timestamp| is the     │
//! │   real timestamp and ValLen/Val are absent              │
//! ├─────────────────────────────────────────────────────────┤
//! │ Offsets (RowCount * 4)                                  │
//! │   [Offset: u32] ... one per row, from start of file     │
//! ├─────────────────────────────────────────────────────────┤
//! │ RowCount: u32 (4)                                       │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod builder;
mod iterator;
mod reader;

use bytes::{Buf, Bytes};

pub use builder::{SSTableBuilder, SSTableMeta};
pub use iterator::SSTableIter;
pub use reader::SSTable;

use crate::row::{Row, Value, LEN_SIZE, TIMESTAMP_SIZE};

// =============================================================================
// Shared Constants (used by builder, reader, iterator)
// =============================================================================

/// Width of one entry of the offset array
pub(crate) const OFFSET_SIZE: usize = 4;

/// Width of the trailing row count
pub(crate) const COUNT_SIZE: usize = 4;

/// Extension of finalized table files
pub const TABLE_EXTENSION: &str = "db";

/// Extension of in-progress flush files
pub const TEMP_EXTENSION: &str = "tmp";

// =============================================================================
// Row Region Access
// =============================================================================

/// Read-only views over the mapped row region and offset array.
///
/// Cloning is cheap: both regions are reference-counted slices of the same
/// mapping, and decoded keys and values borrow from it without copying.
#[derive(Clone)]
pub(crate) struct RowRegion {
    rows: Bytes,
    offsets: Bytes,
    row_count: usize,
}

impl RowRegion {
    pub(crate) fn new(rows: Bytes, offsets: Bytes, row_count: usize) -> Self {
        Self {
            rows,
            offsets,
            row_count,
        }
    }

    pub(crate) fn row_count(&self) -> usize {
        self.row_count
    }

    pub(crate) fn rows_len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn offset(&self, index: usize) -> Option<usize> {
        let start = index.checked_mul(OFFSET_SIZE)?;
        let mut slot = self.offsets.get(start..start + OFFSET_SIZE)?;
        Some(slot.get_u32() as usize)
    }

    /// Key bytes of the row at `index`
    pub(crate) fn key_at(&self, index: usize) -> Option<&[u8]> {
        let offset = self.offset(index)?;
        let (start, end) = self.key_bounds(offset)?;
        self.rows.get(start..end)
    }

    fn key_bounds(&self, offset: usize) -> Option<(usize, usize)> {
        let mut prefix = self.rows.get(offset..offset.checked_add(LEN_SIZE)?)?;
        let key_len = prefix.get_u32() as usize;
        let start = offset + LEN_SIZE;
        let end = start.checked_add(key_len)?;
        (end <= self.rows.len()).then_some((start, end))
    }

    /// Decode the row at `index`, returning it with the offset just past it
    pub(crate) fn row_at(&self, index: usize) -> Option<(Row, usize)> {
        let offset = self.offset(index)?;
        let (key_start, key_end) = self.key_bounds(offset)?;
        let key = self.rows.slice(key_start..key_end);

        let mut stamp = self.rows.get(key_end..key_end.checked_add(TIMESTAMP_SIZE)?)?;
        let timestamp = stamp.get_i64();
        let cursor = key_end + TIMESTAMP_SIZE;

        if timestamp < 0 {
            let timestamp = timestamp.checked_neg()?;
            return Some((Row::new(key, Value::Tombstone { timestamp }), cursor));
        }

        let mut prefix = self.rows.get(cursor..cursor.checked_add(LEN_SIZE)?)?;
        let value_len = prefix.get_u32() as usize;
        let value_start = cursor + LEN_SIZE;
        let value_end = value_start.checked_add(value_len)?;
        if value_end > self.rows.len() {
            return None;
        }
        let data = self.rows.slice(value_start..value_end);

        Some((Row::new(key, Value::Data { timestamp, data }), value_end))
    }

    /// Lower bound: first index whose key is >= `key`, or `row_count`
    pub(crate) fn position(&self, key: &[u8]) -> usize {
        let mut left = 0usize;
        let mut right = self.row_count;
        while left < right {
            let mid = left + (right - left) / 2;
            // Unreadable keys only exist in tables that failed validation
            let Some(mid_key) = self.key_at(mid) else {
                return self.row_count;
            };
            match mid_key.cmp(key) {
                std::cmp::Ordering::Less => left = mid + 1,
                std::cmp::Ordering::Greater => right = mid,
                std::cmp::Ordering::Equal => return mid,
            }
        }
        left
    }
}
