//! Configuration for CaskKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Default rollover threshold for the active segment (32 MiB)
pub const DEFAULT_MAX_SEGMENT_SIZE: u64 = 32 * 1024 * 1024;

/// Main configuration for a CaskKV store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding every segment file of the store
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── 00000001.data
    ///     ├── 00000002.data
    ///     └── ...
    pub data_dir: PathBuf,

    /// When false, `put`/`delete`/`merge` fail and no active segment is opened
    pub read_write: bool,

    /// Rollover happens once the active segment grows past this many bytes
    pub max_segment_size: u64,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the active segment
    pub sync_strategy: SyncStrategy,
}

/// Segment sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Leave flushing to the OS (fastest, data may be lost on crash)
    Never,

    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./caskkv_data"),
            read_write: true,
            max_segment_size: DEFAULT_MAX_SEGMENT_SIZE,
            sync_strategy: SyncStrategy::Never,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (one store per directory)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Open the store read-write (default) or read-only
    pub fn read_write(mut self, read_write: bool) -> Self {
        self.config.read_write = read_write;
        self
    }

    /// Set the segment rollover threshold (in bytes)
    pub fn max_segment_size(mut self, size: u64) -> Self {
        self.config.max_segment_size = size;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Shorthand: fsync every write when true, never when false
    pub fn sync_on_write(mut self, enabled: bool) -> Self {
        self.config.sync_strategy = if enabled {
            SyncStrategy::EveryWrite
        } else {
            SyncStrategy::Never
        };
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
