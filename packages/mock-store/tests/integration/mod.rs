//! Integration test suite for the store.
//!
//! 1. Store semantics through the public API
//! 2. File-backed store durability and rollback

pub mod persistence_tests;
pub mod store_tests;
