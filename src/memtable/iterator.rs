//! MemTable Iterator
//!
//! Owned, lazy iteration over a snapshot of the MemTable's rows.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use bytes::Bytes;

use crate::row::Row;

/// Iterator over a shared snapshot of MemTable rows in ascending key order.
///
/// Holds the map by `Arc`, so it outlives any lock on the engine. Each step
/// re-seeks just past the last key returned, which keeps every step
/// logarithmic and never copies more than the row being yielded.
pub struct MemTableIter {
    rows: Arc<BTreeMap<Bytes, Row>>,
    lower: Bound<Bytes>,
}

impl MemTableIter {
    pub(super) fn new(rows: Arc<BTreeMap<Bytes, Row>>, from: &[u8]) -> Self {
        Self {
            rows,
            lower: Bound::Included(Bytes::copy_from_slice(from)),
        }
    }
}

impl Iterator for MemTableIter {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        let lower: Bound<&[u8]> = match &self.lower {
            Bound::Included(key) => Bound::Included(key.as_ref()),
            Bound::Excluded(key) => Bound::Excluded(key.as_ref()),
            Bound::Unbounded => Bound::Unbounded,
        };

        let row = self
            .rows
            .range::<[u8], _>((lower, Bound::Unbounded))
            .next()
            .map(|(_, row)| row.clone())?;

        self.lower = Bound::Excluded(row.key.clone());
        Some(row)
    }
}

impl std::iter::FusedIterator for MemTableIter {}
