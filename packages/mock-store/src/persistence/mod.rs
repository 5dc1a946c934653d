//! Backing file load and atomic rewrite.

pub mod io_utils;

#[cfg(test)]
mod test;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::store::Snapshot;

use io_utils::{classify_io_error, retry_io_operation};

/// Mirrors the store to a single JSON file.
#[derive(Debug, Clone)]
pub struct PersistenceManager {
    path: PathBuf,
    max_retries: u32,
    retry_delay_ms: u64,
}

impl PersistenceManager {
    /// Creates a persistence manager for `path`.
    pub fn new(path: PathBuf, config: &StoreConfig) -> Self {
        Self {
            path,
            max_retries: config.persistence_max_retries,
            retry_delay_ms: config.persistence_retry_delay_ms,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "db.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Loads the backing file.
    ///
    /// # Returns
    /// An empty snapshot if the file does not exist or is blank,
    /// `DataCorruption` if it is not a valid database document.
    pub fn load(&self) -> Result<Snapshot, StoreError> {
        if !self.path.exists() {
            tracing::info!(
                "No database file at {}, starting empty",
                self.path.display()
            );
            return Ok(Snapshot::default());
        }

        let contents = retry_io_operation(
            || {
                fs::read_to_string(&self.path)
                    .map_err(|e| classify_io_error(e, "Failed to read database file"))
            },
            self.max_retries,
            self.retry_delay_ms,
            "load",
        )?;

        if contents.trim().is_empty() {
            return Ok(Snapshot::default());
        }

        serde_json::from_str(&contents).map_err(|e| {
            StoreError::DataCorruption(format!("{}: {}", self.path.display(), e))
        })
    }

    /// Rewrites the backing file with `snapshot`.
    ///
    /// The document is written to a sibling temp file, synced, then renamed
    /// over the target so readers never observe a partial file.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        let result = retry_io_operation(
            || self.write_atomically(json.as_bytes()),
            self.max_retries,
            self.retry_delay_ms,
            "save",
        );
        match &result {
            Ok(()) => tracing::debug!("Persisted database to {}", self.path.display()),
            Err(e) => tracing::error!("Failed to persist {}: {}", self.path.display(), e),
        }
        result
    }

    fn write_atomically(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| classify_io_error(e, "Failed to create data directory"))?;
        }

        let temp_path = self.temp_path();
        let mut file = File::create(&temp_path)
            .map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
        file.write_all(bytes)
            .map_err(|e| classify_io_error(e, "Failed to write database"))?;
        file.sync_all()
            .map_err(|e| classify_io_error(e, "Failed to sync database"))?;

        // Atomic rename
        fs::rename(&temp_path, &self.path)
            .map_err(|e| classify_io_error(e, "Failed to rename database file"))
    }
}
