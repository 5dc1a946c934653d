//! REST API for the course mock server.
//!
//! Provides the collection routes for courses, students and enrollments,
//! CORS and request-log middleware, and the hyper server loop.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
