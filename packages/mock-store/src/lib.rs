//! Resource store for the course mock server.
//!
//! Provides the course, student and enrollment record types, request body
//! decoding and validation, the lock-guarded store, and the optional
//! single-file persistence mirror.

pub mod codec;
pub mod collection;
pub mod config;
pub mod error;
pub mod persistence;
pub mod record;
pub mod store;

pub use error::StoreError;
pub use record::{Course, Enrollment, Record, ResourceKind, Student};
pub use store::Store;
