//! Iterator Module
//!
//! The read pipeline shared by every range scan:
//! merge all sources → keep the newest row per key → drop tombstones →
//! project to records.

pub mod merge;

use bytes::Bytes;

pub use merge::{MergeIterator, RowSource};

use crate::row::{Record, Row};

/// Keeps only the first row of each run of equal keys.
///
/// Fed by a [`MergeIterator`], the first row of a run is the newest version.
pub struct Collapse<I> {
    inner: I,
    last_key: Option<Bytes>,
}

impl<I: Iterator<Item = Row>> Collapse<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            last_key: None,
        }
    }
}

impl<I: Iterator<Item = Row>> Iterator for Collapse<I> {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = self.inner.next()?;
            if self.last_key.as_ref() == Some(&row.key) {
                continue;
            }
            self.last_key = Some(row.key.clone());
            return Some(row);
        }
    }
}

/// Visible records of a merged read: newest version per key, tombstones
/// removed. Ascending by key; ends with `None`, never with an error.
pub struct Records {
    inner: Collapse<MergeIterator>,
}

impl Records {
    /// Build the read pipeline over sources ranked newest first
    pub fn new(sources: Vec<RowSource>) -> Self {
        Self {
            inner: Collapse::new(MergeIterator::new(sources)),
        }
    }
}

impl Iterator for Records {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.by_ref().find_map(Row::into_record)
    }
}
