//! SSTable Iterator
//!
//! Ordered iteration over the rows of a mapped table.

use std::path::PathBuf;

use crate::row::Row;

use super::RowRegion;

/// Iterator over SSTable rows in ascending key order
pub struct SSTableIter {
    region: RowRegion,
    /// Index of the next row to decode
    position: usize,
    path: PathBuf,
}

impl SSTableIter {
    pub(super) fn new(region: RowRegion, position: usize, path: PathBuf) -> Self {
        Self {
            region,
            position,
            path,
        }
    }
}

impl Iterator for SSTableIter {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.region.row_count() {
            return None;
        }

        match self.region.row_at(self.position) {
            Some((row, _)) => {
                self.position += 1;
                Some(row)
            }
            None => {
                // Opened tables are validated, so this means the file changed underneath us
                tracing::error!(
                    path = %self.path.display(),
                    row = self.position,
                    "Undecodable row, ending iteration"
                );
                self.position = self.region.row_count();
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.region.row_count().saturating_sub(self.position);
        (0, Some(remaining))
    }
}

impl std::iter::FusedIterator for SSTableIter {}
