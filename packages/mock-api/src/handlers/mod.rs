//! HTTP endpoint implementations for the resource collections.

pub mod request_utils;
pub mod resource_handlers;
pub mod response;

pub use resource_handlers::{
    create_record, database_snapshot, delete_record, list_enrollments_of, list_records,
    merge_record, read_record, replace_record,
};
pub use response::{error_response, ErrorResponse};

/// Calls a handler generic over `Record` with the type named by a `ResourceKind`.
macro_rules! for_resource {
    ($kind:expr, $handler:ident($($arg:expr),* $(,)?)) => {
        match $kind {
            mock_store::ResourceKind::Courses => $handler::<mock_store::Course>($($arg),*),
            mock_store::ResourceKind::Students => $handler::<mock_store::Student>($($arg),*),
            mock_store::ResourceKind::Enrollments => {
                $handler::<mock_store::Enrollment>($($arg),*)
            }
        }
    };
}
pub(crate) use for_resource;
