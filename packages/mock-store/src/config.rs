//! Store configuration.

use std::path::PathBuf;

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backing JSON file; `None` keeps everything in memory
    pub db_path: Option<PathBuf>,
    /// Load the backing file but never write it back
    pub read_only: bool,
    /// Maximum retry attempts for transient I/O errors
    pub persistence_max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub persistence_retry_delay_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            read_only: false,
            persistence_max_retries: 3,      // Default retry attempts
            persistence_retry_delay_ms: 100, // 100ms delay between retries
        }
    }
}

impl StoreConfig {
    /// In-memory configuration mirrored to `path`.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(path.into()),
            ..Default::default()
        }
    }
}
