//! Row and Value types
//!
//! A row is the versioned unit of storage: a key plus a timestamped value
//! that is either live data or a tombstone.

use std::cmp::Ordering;

use bytes::Bytes;

/// Width of a `u32` length prefix
pub(crate) const LEN_SIZE: usize = 4;

/// Width of an `i64` timestamp
pub(crate) const TIMESTAMP_SIZE: usize = 8;

/// Timestamped value of a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A live value
    Data { timestamp: i64, data: Bytes },

    /// A deletion marker
    Tombstone { timestamp: i64 },
}

impl Value {
    pub fn timestamp(&self) -> i64 {
        match self {
            Value::Data { timestamp, .. } | Value::Tombstone { timestamp } => *timestamp,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Value::Tombstone { .. })
    }

    /// Payload bytes, `None` for a tombstone
    pub fn data(&self) -> Option<&Bytes> {
        match self {
            Value::Data { data, .. } => Some(data),
            Value::Tombstone { .. } => None,
        }
    }

    /// Encoded footprint of the value part of a row:
    /// the timestamp, plus length prefix and payload for live data.
    pub fn size_bytes(&self) -> u64 {
        match self {
            Value::Data { data, .. } => (TIMESTAMP_SIZE + LEN_SIZE + data.len()) as u64,
            Value::Tombstone { .. } => TIMESTAMP_SIZE as u64,
        }
    }
}

/// Key plus its timestamped value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub key: Bytes,
    pub value: Value,
}

impl Row {
    pub fn new(key: Bytes, value: Value) -> Self {
        Self { key, value }
    }

    pub fn data(key: Bytes, data: Bytes, timestamp: i64) -> Self {
        Self::new(key, Value::Data { timestamp, data })
    }

    pub fn tombstone(key: Bytes, timestamp: i64) -> Self {
        Self::new(key, Value::Tombstone { timestamp })
    }

    pub fn timestamp(&self) -> i64 {
        self.value.timestamp()
    }

    pub fn is_tombstone(&self) -> bool {
        self.value.is_tombstone()
    }

    /// Exact number of bytes this row occupies in a table file
    pub fn size_bytes(&self) -> u64 {
        (LEN_SIZE + self.key.len()) as u64 + self.value.size_bytes()
    }

    /// Merge order: key ascending, then newest version first
    pub fn merge_cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| other.timestamp().cmp(&self.timestamp()))
    }

    /// Project a live row into a record; tombstones have no record
    pub fn into_record(self) -> Option<Record> {
        match self.value {
            Value::Data { data, .. } => Some(Record {
                key: self.key,
                value: data,
            }),
            Value::Tombstone { .. } => None,
        }
    }
}

/// A visible key/value pair returned by engine reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Bytes,
    pub value: Bytes,
}
