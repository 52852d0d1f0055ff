//! Error types for PolarKV
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using PolarError
pub type Result<T> = std::result::Result<T, PolarError>;

/// Unified error type for PolarKV operations
#[derive(Debug, Error)]
pub enum PolarError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    /// A table file that is empty, truncated, oversized or otherwise malformed
    #[error("Invalid table file {}: {reason}", path.display())]
    InvalidTable { path: PathBuf, reason: String },

    /// Mutation attempted on a write-once table
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    /// Write attempted after a successful `close`
    #[error("Engine is closed")]
    Closed,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PolarError {
    pub(crate) fn invalid_table(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidTable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
