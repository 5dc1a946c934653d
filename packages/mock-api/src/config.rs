//! HTTP layer configuration.

/// HTTP layer configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Add `Access-Control-Allow-*` headers and answer pre-flight requests
    pub cors: bool,
    /// Log one line per request
    pub log_requests: bool,
    /// Request body read timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Largest accepted request body in bytes; larger bodies get 413
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            cors: false,
            log_requests: true,
            request_timeout_ms: 5000, // 5 seconds default
            max_body_bytes: 1024 * 1024,
        }
    }
}
