//! Store error types.

use thiserror::Error;

/// Store operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Record not found in its own collection
    #[error("{resource} '{id}' not found")]
    NotFound { resource: &'static str, id: String },

    /// Malformed body or dangling reference
    #[error("{message}")]
    Validation {
        field: Option<String>,
        message: String,
    },

    /// Duplicate id in a collection
    #[error("{resource} '{id}' already exists")]
    Conflict { resource: &'static str, id: String },

    /// No numeric id left to assign in a collection
    #[error("No ids left to assign for {resource}")]
    IdSpaceExhausted { resource: &'static str },

    /// Lock poisoned (RwLock poisoned)
    #[error("Lock poisoned")]
    LockPoisoned,

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Data corruption detected in the backing file
    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    /// Disk full error during persistence
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),
}

impl StoreError {
    /// Validation failure attributed to a single field.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        StoreError::Validation {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }

    /// Validation failure of the body as a whole.
    pub fn invalid_body(message: impl Into<String>) -> Self {
        StoreError::Validation {
            field: None,
            message: message.into(),
        }
    }
}
