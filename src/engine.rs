//! Engine Module
//!
//! The storage engine facade that coordinates all components.
//!
//! ## Responsibilities
//! - Route writes to the MemTable
//! - Flush the MemTable to a new SSTable once it crosses the threshold
//! - Answer reads by merging the MemTable with every SSTable
//! - Flush remaining writes on close (or, failing that, on drop)

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::clock::TimestampSource;
use crate::config::Config;
use crate::error::{PolarError, Result};
use crate::iterator::{Records, RowSource};
use crate::memtable::MemTable;
use crate::row::Row;
use crate::storage::StorageManager;
use crate::table::Table;

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (upsert/remove/flush/close): take the write lock on `state`
///   - Only ONE write operation at a time
///   - A threshold flush runs inside the same exclusive section; the
///     MemTable is replaced only after the new table is published
///
/// - **Reads** (iter_from/get): take the read lock just long enough to
///   grab an `Arc` snapshot of the MemTable map and of the table list
///   - Iteration itself runs without any lock
///   - SSTables are immutable, so snapshots of them stay valid
///
/// ## Shutdown
/// `close` flushes and marks the engine closed only once the flush
/// succeeded, so a failed close can be retried. Dropping an engine that
/// was never closed makes one best-effort flush.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Timestamps shared by every MemTable this engine creates
    clock: Arc<TimestampSource>,

    /// Live MemTable + published SSTables
    state: RwLock<EngineState>,
}

struct EngineState {
    memtable: MemTable,
    storage: StorageManager,
    /// Set by a successful `close`; later writes are refused
    closed: bool,
}

impl Engine {
    /// Open an engine over an existing data directory with the system clock
    pub fn open(config: Config) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(TimestampSource::system()))
    }

    /// Open an engine stamping writes from `clock`
    ///
    /// On startup:
    /// 1. Validate the config
    /// 2. Discover existing SSTables (invalid ones are skipped)
    /// 3. Start with an empty MemTable
    pub fn open_with_clock(config: Config, clock: Arc<TimestampSource>) -> Result<Self> {
        config.validate()?;

        let storage = StorageManager::open(&config.data_dir)?;
        let memtable = MemTable::with_clock(Arc::clone(&clock));

        tracing::info!(
            dir = %config.data_dir.display(),
            tables = storage.table_count(),
            flush_threshold = config.flush_threshold_bytes,
            "Engine opened"
        );

        Ok(Self {
            config,
            clock,
            state: RwLock::new(EngineState {
                memtable,
                storage,
                closed: false,
            }),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// Visible records with key >= `from`, ascending by key.
    ///
    /// Duplicate keys across the MemTable and SSTables resolve to the
    /// highest timestamp; keys whose newest version is a tombstone are
    /// omitted. Equal timestamps favour the most recently written source.
    pub fn iter_from(&self, from: &[u8]) -> Records {
        let sources = {
            let state = self.state.read();
            let tables = state.storage.tables();

            // Rank order: MemTable first, then tables newest → oldest
            let mut ranked: Vec<&dyn Table> = Vec::with_capacity(tables.len() + 1);
            ranked.push(&state.memtable);
            ranked.extend(tables.iter().rev().map(|table| &**table as &dyn Table));

            let sources: Vec<RowSource> =
                ranked.into_iter().map(|table| table.iter_from(from)).collect();
            sources
        };

        Records::new(sources)
    }

    /// Point lookup.
    ///
    /// Resolves the same way as `iter_from`, but looks `key` up in each
    /// source directly instead of merging: one map lookup plus one binary
    /// search per table whose key range covers `key`.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        let (buffered, tables) = {
            let state = self.state.read();
            (state.memtable.get(key).cloned(), state.storage.tables())
        };

        let stored = tables
            .iter()
            .rev()
            .filter(|table| table.might_contain(key))
            .filter_map(|table| table.get(key));

        // Strictly greater, so the earlier (newer) source keeps a tie
        buffered
            .into_iter()
            .chain(stored)
            .reduce(|newest, row| if row.timestamp() > newest.timestamp() { row } else { newest })
            .and_then(Row::into_record)
            .map(|record| record.value)
    }

    /// Insert or replace the value for `key`
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Write to MemTable
    /// 3. Flush if the threshold is reached
    pub fn upsert(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut state = self.state.write();
        if state.closed {
            return Err(PolarError::Closed);
        }
        state
            .memtable
            .upsert(Bytes::copy_from_slice(key), Bytes::copy_from_slice(value));
        self.maybe_flush(&mut state)
    }

    /// Delete `key` by writing a tombstone
    pub fn remove(&self, key: &[u8]) -> Result<()> {
        let mut state = self.state.write();
        if state.closed {
            return Err(PolarError::Closed);
        }
        state.memtable.remove(Bytes::copy_from_slice(key));
        self.maybe_flush(&mut state)
    }

    /// Flush the MemTable to disk regardless of its size
    pub fn flush(&self) -> Result<()> {
        let mut state = self.state.write();
        Self::flush_locked(&mut state)
    }

    fn maybe_flush(&self, state: &mut EngineState) -> Result<()> {
        if state.memtable.size_bytes() >= self.config.flush_threshold_bytes {
            Self::flush_locked(state)?;
        }
        Ok(())
    }

    /// Internal flush implementation (called with write lock held)
    fn flush_locked(state: &mut EngineState) -> Result<()> {
        // Skip if memtable is empty
        if state.memtable.is_empty() {
            return Ok(());
        }

        // On failure the MemTable stays as the only copy of these rows
        state.storage.flush(state.memtable.rows())?;
        let flushed = state.memtable.take();

        tracing::debug!(
            rows = flushed.len(),
            bytes = flushed.size_bytes(),
            tables = state.storage.table_count(),
            "MemTable flushed"
        );

        Ok(())
    }

    /// Close the engine gracefully
    ///
    /// Flushes any pending data. The engine is marked closed only if the
    /// flush succeeds; on error it keeps every buffered write and `close`
    /// may be called again. Closing twice is a no-op.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.write();
        if state.closed {
            return Ok(());
        }

        Self::flush_locked(&mut state)?;
        state.closed = true;

        tracing::info!(tables = state.storage.table_count(), "Engine closed");
        Ok(())
    }

    /// Whether `close` has completed successfully
    pub fn is_closed(&self) -> bool {
        self.state.read().closed
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the current serialized MemTable size
    pub fn memtable_size(&self) -> u64 {
        self.state.read().memtable.size_bytes()
    }

    /// Get the MemTable row count
    pub fn memtable_len(&self) -> usize {
        self.state.read().memtable.len()
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.state.read().storage.table_count()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the timestamp source
    pub fn clock(&self) -> &Arc<TimestampSource> {
        &self.clock
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.closed || state.memtable.is_empty() {
            return;
        }

        tracing::warn!(rows = state.memtable.len(), "Engine dropped without close, flushing");
        if let Err(e) = Self::flush_locked(state) {
            tracing::error!(
                error = %e,
                rows = state.memtable.len(),
                "Flush on drop failed, buffered writes are lost"
            );
        }
    }
}
