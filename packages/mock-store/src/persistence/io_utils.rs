//! I/O utilities for persistence operations.

use std::io::ErrorKind;

use crate::error::StoreError;

/// Classifies I/O errors into specific StoreError variants.
pub fn classify_io_error(error: std::io::Error, context: &str) -> StoreError {
    match error.kind() {
        ErrorKind::StorageFull | ErrorKind::OutOfMemory => {
            StoreError::DiskFull(format!("{}: {}", context, error))
        }
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => {
            StoreError::TransientIoError(format!("{}: {}", context, error))
        }
        _ => StoreError::IoError(format!("{}: {}", context, error)),
    }
}

/// Retries an operation that may fail with transient I/O errors.
pub fn retry_io_operation<F, T>(
    mut operation: F,
    max_retries: u32,
    retry_delay_ms: u64,
    context: &str,
) -> Result<T, StoreError>
where
    F: FnMut() -> Result<T, StoreError>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(StoreError::TransientIoError(msg)) if attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    "Transient I/O error in {} (attempt {}/{}): {}",
                    context,
                    attempt,
                    max_retries,
                    msg
                );
                if retry_delay_ms > 0 {
                    std::thread::sleep(std::time::Duration::from_millis(retry_delay_ms));
                }
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_classify_io_error() {
        let err = classify_io_error(io::Error::from(ErrorKind::Interrupted), "write");
        assert!(matches!(err, StoreError::TransientIoError(_)));

        let err = classify_io_error(io::Error::from(ErrorKind::PermissionDenied), "write");
        assert!(matches!(err, StoreError::IoError(msg) if msg.starts_with("write")));
    }

    #[test]
    fn test_retry_stops_after_max_retries() {
        let mut calls = 0;
        let result: Result<(), StoreError> = retry_io_operation(
            || {
                calls += 1;
                Err(StoreError::TransientIoError("busy".to_string()))
            },
            2,
            0,
            "test",
        );
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_retry_does_not_retry_permanent_errors() {
        let mut calls = 0;
        let result: Result<(), StoreError> = retry_io_operation(
            || {
                calls += 1;
                Err(StoreError::IoError("denied".to_string()))
            },
            5,
            0,
            "test",
        );
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_retry_recovers_from_transient_error() {
        let mut calls = 0;
        let result = retry_io_operation(
            || {
                calls += 1;
                if calls < 2 {
                    Err(StoreError::TransientIoError("busy".to_string()))
                } else {
                    Ok(calls)
                }
            },
            3,
            0,
            "test",
        );
        assert_eq!(result.unwrap(), 2);
    }
}
