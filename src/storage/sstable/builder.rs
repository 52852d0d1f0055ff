//! SSTable Builder
//!
//! Writes sorted rows to a new SSTable file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{PolarError, Result};
use crate::row::{Row, Value};

/// Summary of a finished table file
#[derive(Debug, Clone)]
pub struct SSTableMeta {
    /// Path the table was written to
    pub path: PathBuf,
    /// Number of rows in the table
    pub row_count: u32,
    /// File size in bytes
    pub file_size: u64,
}

/// Builder for creating new SSTables from sorted rows
pub struct SSTableBuilder {
    /// Output file path
    path: PathBuf,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    /// Start offset of every row written so far
    offsets: Vec<u32>,
    /// Current write position
    current_offset: u64,
    /// Scratch buffer reused for each encoded row
    scratch: BytesMut,
    /// Key of the last row added, for the ordering check
    last_key: Option<Bytes>,
}

impl SSTableBuilder {
    /// Create a new SSTable builder.
    ///
    /// The file must not exist yet; tables are written exactly once.
    pub fn new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            offsets: Vec::new(),
            current_offset: 0,
            scratch: BytesMut::new(),
            last_key: None,
        })
    }

    /// Append a row. Keys must be strictly ascending.
    pub fn add(&mut self, row: &Row) -> Result<()> {
        if let Some(last) = &self.last_key {
            if row.key <= *last {
                return Err(self.invalid("rows must be added in strictly ascending key order"));
            }
        }

        let offset = u32::try_from(self.current_offset)
            .map_err(|_| self.invalid("table exceeds the 4 GiB addressable size"))?;
        let key_len = u32::try_from(row.key.len()).map_err(|_| self.invalid("key too large"))?;

        self.scratch.clear();
        self.scratch.put_u32(key_len);
        self.scratch.put_slice(&row.key);
        match &row.value {
            Value::Data { timestamp, data } => {
                if *timestamp < 0 {
                    return Err(self.invalid("live rows need a non-negative timestamp"));
                }
                let value_len =
                    u32::try_from(data.len()).map_err(|_| self.invalid("value too large"))?;
                self.scratch.put_i64(*timestamp);
                self.scratch.put_u32(value_len);
                self.scratch.put_slice(data);
            }
            Value::Tombstone { timestamp } => {
                // Negated on disk, so zero would read back as a live row
                if *timestamp <= 0 {
                    return Err(self.invalid("tombstones need a positive timestamp"));
                }
                self.scratch.put_i64(-*timestamp);
            }
        }

        self.writer.write_all(&self.scratch)?;
        self.offsets.push(offset);
        self.current_offset += self.scratch.len() as u64;

        self.last_key = Some(row.key.clone());

        Ok(())
    }

    /// Number of rows added so far
    pub fn row_count(&self) -> usize {
        self.offsets.len()
    }

    /// Finish building: write the offset array and row count, then sync
    pub fn finish(mut self) -> Result<SSTableMeta> {
        let row_count = u32::try_from(self.offsets.len())
            .map_err(|_| self.invalid("too many rows for one table"))?;

        let mut trailer = BytesMut::with_capacity(self.offsets.len() * 4 + 4);
        for offset in &self.offsets {
            trailer.put_u32(*offset);
        }
        trailer.put_u32(row_count);

        let file_size = self.current_offset + trailer.len() as u64;
        if file_size > u32::MAX as u64 {
            return Err(self.invalid("table exceeds the 4 GiB addressable size"));
        }
        self.writer.write_all(&trailer)?;
        self.writer.flush()?;

        let file = self.writer.into_inner().map_err(|e| PolarError::Io(e.into_error()))?;
        file.sync_all()?;

        Ok(SSTableMeta {
            path: self.path,
            row_count,
            file_size,
        })
    }

    fn invalid(&self, reason: &str) -> PolarError {
        PolarError::invalid_table(&self.path, reason)
    }
}
