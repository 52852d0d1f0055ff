//! Merge Iterator
//!
//! Heap-based k-way merge over sorted row sources.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::row::Row;

/// A boxed, owned row source that can cross threads
pub type RowSource = Box<dyn Iterator<Item = Row> + Send>;

/// Merges multiple sorted sources into one stream ordered by
/// `(key ASC, timestamp DESC, source rank ASC)`.
///
/// Sources are ranked by position: index 0 is the most recently written
/// source (the MemTable), higher indices are older tables. Rank only breaks
/// ties between equal keys with equal timestamps.
pub struct MergeIterator {
    sources: Vec<RowSource>,
    heap: BinaryHeap<HeapEntry>,
}

struct HeapEntry {
    row: Row,
    rank: usize,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: reverse so smallest key / newest / lowest rank pops first
        self.row
            .merge_cmp(&other.row)
            .then_with(|| self.rank.cmp(&other.rank))
            .reverse()
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl MergeIterator {
    pub fn new(mut sources: Vec<RowSource>) -> Self {
        let mut heap = BinaryHeap::with_capacity(sources.len());
        for (rank, source) in sources.iter_mut().enumerate() {
            if let Some(row) = source.next() {
                heap.push(HeapEntry { row, rank });
            }
        }
        Self { sources, heap }
    }
}

impl Iterator for MergeIterator {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        let HeapEntry { row, rank } = self.heap.pop()?;
        if let Some(next) = self.sources[rank].next() {
            self.heap.push(HeapEntry { row: next, rank });
        }
        Some(row)
    }
}
