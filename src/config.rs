//! Configuration for PolarKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{PolarError, Result};

/// Main configuration for a PolarKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Flat directory holding every table file.
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── 01700000000000000000.db   (finalized tables)
    ///     └── 01700000000000000001.tmp  (in-progress flush, renamed away)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // MemTable Configuration
    // -------------------------------------------------------------------------
    /// Serialized MemTable size (in bytes) at which a write triggers a flush
    pub flush_threshold_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./polarkv_data"),
            flush_threshold_bytes: 4 * 1024 * 1024, // 4 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the construction parameters.
    ///
    /// The data directory must already exist and be a directory; the
    /// threshold must be positive.
    pub fn validate(&self) -> Result<()> {
        if self.flush_threshold_bytes == 0 {
            return Err(PolarError::Config(
                "flush threshold must be a positive number of bytes".to_string(),
            ));
        }

        if !self.data_dir.exists() {
            return Err(PolarError::Config(format!(
                "data directory {} does not exist",
                self.data_dir.display()
            )));
        }

        if !self.data_dir.is_dir() {
            return Err(PolarError::Config(format!(
                "{} is not a directory",
                self.data_dir.display()
            )));
        }

        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the flush threshold (in bytes)
    pub fn flush_threshold_bytes(mut self, bytes: u64) -> Self {
        self.config.flush_threshold_bytes = bytes;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
