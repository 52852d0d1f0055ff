//! SSTable Reader
//!
//! Maps a table file read-only and serves binary-search lookups and ordered
//! iteration straight from the mapping.

use std::fs::File;
use std::path::{Path, PathBuf};

use bytes::{Buf, Bytes};
use memmap2::Mmap;

use crate::error::{PolarError, Result};
use crate::iterator::RowSource;
use crate::row::Row;
use crate::table::Table;

use super::iterator::SSTableIter;
use super::{RowRegion, COUNT_SIZE, OFFSET_SIZE};

/// Immutable, memory-mapped sorted table
pub struct SSTable {
    path: PathBuf,
    region: RowRegion,
    file_size: u64,
    /// First and last key, `None` for an empty table
    key_range: Option<(Bytes, Bytes)>,
}

impl SSTable {
    /// Open and validate a table file.
    ///
    /// Rejects files that are empty, too small to hold a row count, larger
    /// than 4 GiB, whose offset array does not fit, or whose rows do not
    /// decode back-to-back in strictly ascending key order.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if file_size < COUNT_SIZE as u64 {
            return Err(PolarError::invalid_table(
                path,
                format!("file is {} bytes, too small for a row count", file_size),
            ));
        }
        if file_size > u32::MAX as u64 {
            return Err(PolarError::invalid_table(path, "file exceeds the 4 GiB addressable size"));
        }

        // SAFETY: tables are never modified after the rename that publishes
        // them, and the mapping is read-only.
        let mmap = unsafe { Mmap::map(&file)? };
        let data = Bytes::from_owner(mmap);
        let len = data.len();

        let mut count_slot = &data[len - COUNT_SIZE..];
        let row_count = count_slot.get_u32() as usize;

        let offsets_len = row_count as u64 * OFFSET_SIZE as u64;
        if offsets_len + COUNT_SIZE as u64 > len as u64 {
            return Err(PolarError::invalid_table(
                path,
                format!("row count {} does not fit in {} bytes", row_count, len),
            ));
        }
        let offsets_start = len - COUNT_SIZE - offsets_len as usize;

        let region = RowRegion::new(
            data.slice(..offsets_start),
            data.slice(offsets_start..len - COUNT_SIZE),
            row_count,
        );
        Self::validate(path, &region)?;
        let last = region.row_count().checked_sub(1);
        let key_range = last
            .and_then(|last| region.key_at(0).zip(region.key_at(last)))
            .map(|(min, max)| (Bytes::copy_from_slice(min), Bytes::copy_from_slice(max)));

        tracing::debug!(path = %path.display(), rows = row_count, bytes = file_size, "Opened SSTable");

        Ok(Self {
            path: path.to_path_buf(),
            region,
            file_size,
            key_range,
        })
    }

    /// Walk every row once so later reads can never leave the mapping
    fn validate(path: &Path, region: &RowRegion) -> Result<()> {
        let mut expected_offset = 0usize;
        let mut previous_key: Option<&[u8]> = None;

        for index in 0..region.row_count() {
            let offset = region.offset(index);
            if offset != Some(expected_offset) {
                return Err(PolarError::invalid_table(
                    path,
                    format!("offset of row {} is {:?}, expected {}", index, offset, expected_offset),
                ));
            }

            let Some((_, end)) = region.row_at(index) else {
                return Err(PolarError::invalid_table(path, format!("row {} is truncated", index)));
            };
            let key = region.key_at(index).unwrap_or_default();
            if previous_key.is_some_and(|previous| previous >= key) {
                return Err(PolarError::invalid_table(
                    path,
                    format!("row {} is out of key order", index),
                ));
            }

            previous_key = Some(key);
            expected_offset = end;
        }

        if expected_offset != region.rows_len() {
            return Err(PolarError::invalid_table(
                path,
                format!(
                    "{} trailing bytes after the last row",
                    region.rows_len() - expected_offset
                ),
            ));
        }

        Ok(())
    }

    /// Rows with key >= `from`, ascending. The iterator owns its view of
    /// the mapping and may outlive any borrow of the table.
    pub fn iter_from(&self, from: &[u8]) -> SSTableIter {
        SSTableIter::new(self.region.clone(), self.region.position(from), self.path.clone())
    }

    /// Range check against the first and last key; `false` means `key`
    /// is definitely absent
    pub fn might_contain(&self, key: &[u8]) -> bool {
        self.key_range
            .as_ref()
            .is_some_and(|(min, max)| key >= min.as_ref() && key <= max.as_ref())
    }

    /// Smallest key held, `None` for an empty table
    pub fn min_key(&self) -> Option<&[u8]> {
        self.key_range.as_ref().map(|(min, _)| min.as_ref())
    }

    /// Largest key held, `None` for an empty table
    pub fn max_key(&self) -> Option<&[u8]> {
        self.key_range.as_ref().map(|(_, max)| max.as_ref())
    }

    /// Row stored for exactly `key`, tombstones included
    pub fn get(&self, key: &[u8]) -> Option<Row> {
        if !self.might_contain(key) {
            return None;
        }
        let index = self.region.position(key);
        if self.region.key_at(index)? != key {
            return None;
        }
        self.region.row_at(index).map(|(row, _)| row)
    }

    pub fn len(&self) -> usize {
        self.region.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.region.row_count() == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}

impl std::fmt::Debug for SSTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SSTable")
            .field("path", &self.path)
            .field("rows", &self.region.row_count())
            .field("file_size", &self.file_size)
            .finish()
    }
}

impl Table for SSTable {
    fn iter_from(&self, from: &[u8]) -> RowSource {
        Box::new(SSTable::iter_from(self, from))
    }

    fn upsert(&mut self, _key: Bytes, _value: Bytes) -> Result<()> {
        Err(PolarError::Unsupported("upsert on an immutable SSTable"))
    }

    fn remove(&mut self, _key: Bytes) -> Result<()> {
        Err(PolarError::Unsupported("remove on an immutable SSTable"))
    }

    fn len(&self) -> usize {
        self.region.row_count()
    }
}
