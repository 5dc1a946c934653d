//! Response types and helpers for HTTP endpoints.

use serde::Serialize;

/// Error body returned for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// HTTP status code
    pub status: u16,
    /// Offending field for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Helper to create error response
pub fn error_response(status: u16, message: String, field: Option<String>) -> ErrorResponse {
    ErrorResponse {
        error: message,
        status,
        field,
    }
}
