//! Storage Manager
//!
//! Owns the data directory and the ordered list of open SSTables.
//!
//! ## Responsibilities
//! - Discover existing tables on startup (oldest → newest by generation)
//! - Turn a sorted row set into a new published table
//! - Hand out snapshots of the table list to readers

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{PolarError, Result};
use crate::row::Row;

use super::{SSTable, SSTableBuilder, TABLE_EXTENSION, TEMP_EXTENSION};

/// Manages the on-disk tables of one data directory
#[derive(Debug)]
pub struct StorageManager {
    /// Flat directory holding every table file
    dir: PathBuf,

    /// Open tables, ordered oldest → newest
    tables: Vec<Arc<SSTable>>,

    /// Generation of the newest table file name seen or written
    last_generation: u64,
}

impl StorageManager {
    /// Open storage in an existing directory.
    ///
    /// On startup:
    /// 1. Scan the directory (one level, files only)
    /// 2. Remove leftover temp files from interrupted flushes
    /// 3. Open every finalized table, oldest generation first; names that
    ///    are not a generation number sort before all others
    /// 4. Skip tables that fail validation, with a warning
    pub fn open(dir: &Path) -> Result<Self> {
        let mut table_paths = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type()?.is_file() {
                continue;
            }

            match path.extension().and_then(OsStr::to_str) {
                Some(TABLE_EXTENSION) => table_paths.push(path),
                Some(TEMP_EXTENSION) => {
                    tracing::warn!(path = %path.display(), "Removing leftover temp file from an interrupted flush");
                    if let Err(e) = fs::remove_file(&path) {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to remove temp file");
                    }
                }
                _ => {}
            }
        }

        table_paths.sort_by_cached_key(|path| {
            (Self::parse_generation(path), path.file_name().map(OsStr::to_os_string))
        });

        let last_generation = table_paths
            .iter()
            .filter_map(|path| Self::parse_generation(path))
            .max()
            .unwrap_or(0);

        let mut tables = Vec::with_capacity(table_paths.len());
        for path in &table_paths {
            match SSTable::open(path) {
                Ok(table) => tables.push(Arc::new(table)),
                Err(e @ PolarError::InvalidTable { .. }) => {
                    tracing::warn!(error = %e, "Skipping invalid table file");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(
            dir = %dir.display(),
            tables = tables.len(),
            skipped = table_paths.len() - tables.len(),
            "Storage opened"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            tables,
            last_generation,
        })
    }

    /// Write `rows` (ascending key order) to a new table and publish it.
    ///
    /// The rows go to a temp file first; the rename to the final name is the
    /// single publish point, so no reader can see a partial table.
    pub fn flush<'a>(&mut self, rows: impl IntoIterator<Item = &'a Row>) -> Result<Arc<SSTable>> {
        let generation = self.next_generation();
        let temp_path = self.table_path(generation, TEMP_EXTENSION);
        let final_path = self.table_path(generation, TABLE_EXTENSION);

        let meta = match Self::write_table(&temp_path, rows) {
            Ok(meta) => meta,
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&temp_path, &final_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        self.sync_dir()?;

        // A freshly written table that fails validation is an integrity bug
        let table = Arc::new(SSTable::open(&final_path)?);
        self.tables.push(Arc::clone(&table));

        tracing::debug!(
            path = %final_path.display(),
            rows = meta.row_count,
            bytes = meta.file_size,
            "Flushed MemTable to SSTable"
        );

        Ok(table)
    }

    fn write_table<'a>(
        path: &Path,
        rows: impl IntoIterator<Item = &'a Row>,
    ) -> Result<super::SSTableMeta> {
        let mut builder = SSTableBuilder::new(path)?;
        for row in rows {
            builder.add(row)?;
        }
        builder.finish()
    }

    /// Snapshot of the open tables, oldest → newest
    pub fn tables(&self) -> Vec<Arc<SSTable>> {
        self.tables.clone()
    }

    /// Get the number of open tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Get the data directory path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Persist the directory entry created by the publishing rename
    #[cfg(unix)]
    fn sync_dir(&self) -> Result<()> {
        fs::File::open(&self.dir)?.sync_all()?;
        Ok(())
    }

    /// Directories cannot be opened as files here; the rename is as durable
    /// as the platform makes it
    #[cfg(not(unix))]
    fn sync_dir(&self) -> Result<()> {
        Ok(())
    }

    /// Nanoseconds since the epoch, bumped past the last generation if the
    /// clock has not moved or went backwards
    fn next_generation(&mut self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        self.last_generation = now.max(self.last_generation + 1);
        self.last_generation
    }

    /// "01700000000000000000.db"
    fn table_path(&self, generation: u64, extension: &str) -> PathBuf {
        self.dir.join(format!("{:020}.{}", generation, extension))
    }

    /// "01700000000000000000.db" → Some(1700000000000000000)
    fn parse_generation(path: &Path) -> Option<u64> {
        path.file_stem()?.to_str()?.parse().ok()
    }
}
