//! Request utilities for HTTP endpoints.

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::{body::Body, body::Bytes, Response};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use tokio::time;

use crate::router::RouterError;
use mock_store::StoreError;

/// Type alias for matchit parameters with explicit lifetimes
pub type MatchitParams<'a, 'b> = matchit::Params<'a, 'b>;

/// Reads the request body, bounded in both time and size.
///
/// # Returns
/// `Timeout` when the body does not arrive within `timeout_ms`,
/// `PayloadTooLarge` when it exceeds `max_bytes`.
pub async fn read_request_body_with_timeout<B>(
    body: B,
    timeout_ms: u64,
    max_bytes: usize,
) -> Result<Bytes, RouterError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let timeout_duration = time::Duration::from_millis(timeout_ms);
    let body = time::timeout(timeout_duration, Limited::new(body, max_bytes).collect())
        .await
        .map_err(|_| RouterError::Timeout)?
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                RouterError::PayloadTooLarge(max_bytes)
            } else {
                RouterError::InternalError(format!("Failed to read request body: {}", e))
            }
        })?;
    Ok(body.to_bytes())
}

/// Map StoreError to appropriate RouterError
pub fn map_store_error_to_router_error(e: StoreError) -> RouterError {
    match e {
        StoreError::NotFound { .. } => RouterError::NotFound(e.to_string()),
        StoreError::Validation { field, message } => RouterError::BadRequest { field, message },
        StoreError::Conflict { .. } | StoreError::IdSpaceExhausted { .. } => {
            RouterError::Conflict(e.to_string())
        }
        _ => RouterError::InternalError(format!("Store error: {}", e)),
    }
}

/// Helper to build HTTP response with proper error handling
pub fn build_response(status: u16, json: Vec<u8>) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Bytes::from(json))
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Serializes `data` and wraps it in a JSON response.
pub fn build_json_response<T: Serialize + ?Sized>(
    status: u16,
    data: &T,
) -> Result<Response<Bytes>, RouterError> {
    let json = mock_store::codec::encode(data).map_err(|e| {
        RouterError::InternalError(format!("Failed to serialize response: {}", e))
    })?;
    build_response(status, json)
}

/// Helper to build empty HTTP response (for 204 No Content)
pub fn build_empty_response(status: u16) -> Result<Response<Bytes>, RouterError> {
    Response::builder()
        .status(status)
        .body(Bytes::new())
        .map_err(|e| RouterError::InternalError(format!("Failed to build response: {}", e)))
}

/// Parse equality filters from URL query string.
///
/// Keys starting with `_` are reserved for list options and skipped, as are
/// pairs without a `=`.
pub fn parse_query_filters(query_str: Option<&str>) -> Vec<(String, String)> {
    let Some(query_str) = query_str else {
        return Vec::new();
    };

    query_str
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| !key.is_empty() && !key.starts_with('_'))
        .map(|(key, value)| {
            let key = percent_decode_str(&key.replace('+', " "))
                .decode_utf8_lossy()
                .into_owned();
            let value = percent_decode_str(&value.replace('+', " "))
                .decode_utf8_lossy()
                .into_owned();
            (key, value)
        })
        .collect()
}
