//! Collection and record handlers, generic over the resource type.

use hyper::{body::Bytes, Response};

use mock_store::codec::{decode_draft, decode_patch};
use mock_store::{Enrollment, Record, ResourceKind};

use crate::router::{AppState, RouterError};

use super::request_utils::{
    build_empty_response, build_json_response, map_store_error_to_router_error,
    parse_query_filters,
};

/// Fails with 404 unless `id` exists in `R`'s collection.
fn ensure_exists<R: Record>(state: &AppState, id: &str) -> Result<(), RouterError> {
    let exists = state
        .store
        .contains(R::KIND, id)
        .map_err(map_store_error_to_router_error)?;
    if exists {
        Ok(())
    } else {
        Err(RouterError::NotFound(format!(
            "{} '{}' not found",
            R::KIND.singular(),
            id
        )))
    }
}

/// Lists a collection.
///
/// # Endpoint
/// `GET /{resource}`
///
/// # Query
/// `?field=value` pairs narrow the list to records whose field equals the
/// value. Every pair must match.
///
/// # Response
/// - **200 OK**: JSON array in insertion order
///
/// # Example
/// ```bash
/// curl 'http://localhost:3000/courses?teacher=Grace'
/// ```
pub fn list_records<R: Record>(
    state: &AppState,
    query: Option<&str>,
) -> Result<Response<Bytes>, RouterError> {
    let filters = parse_query_filters(query);
    let records = state
        .store
        .list_matching::<R>(&filters)
        .map_err(map_store_error_to_router_error)?;
    build_json_response(200, &records)
}

/// Reads a single record.
///
/// # Endpoint
/// `GET /{resource}/{id}`
///
/// # Response
/// - **200 OK**: the record
///
/// # Errors
/// - **404 Not Found**: unknown id
pub fn read_record<R: Record>(state: &AppState, id: &str) -> Result<Response<Bytes>, RouterError> {
    let record = state
        .store
        .get::<R>(id)
        .map_err(map_store_error_to_router_error)?;
    build_json_response(200, &record)
}

/// Creates a record. A client-supplied `id` is ignored.
///
/// # Endpoint
/// `POST /{resource}`
///
/// # Response
/// - **201 Created**: the stored record including its assigned id
///
/// # Errors
/// - **400 Bad Request**: malformed body, missing or non-string field,
///   or an enrollment referencing an unknown student or course
///
/// # Example
/// ```bash
/// curl -X POST http://localhost:3000/students \
///   -H "Content-Type: application/json" \
///   -d '{"name": "Ana", "email": "ana@x.com"}'
/// ```
pub fn create_record<R: Record>(
    state: &AppState,
    body: &Bytes,
) -> Result<Response<Bytes>, RouterError> {
    let draft = decode_draft::<R>(body).map_err(map_store_error_to_router_error)?;
    let record = state
        .store
        .create::<R>(draft)
        .map_err(map_store_error_to_router_error)?;
    build_json_response(201, &record)
}

/// Replaces every field of a record except its id.
///
/// # Endpoint
/// `PUT /{resource}/{id}`
///
/// # Response
/// - **200 OK**: the updated record
///
/// # Errors
/// - **404 Not Found**: unknown id (checked before the body)
/// - **400 Bad Request**: invalid body or dangling reference
pub fn replace_record<R: Record>(
    state: &AppState,
    id: &str,
    body: &Bytes,
) -> Result<Response<Bytes>, RouterError> {
    ensure_exists::<R>(state, id)?;
    let draft = decode_draft::<R>(body).map_err(map_store_error_to_router_error)?;
    let record = state
        .store
        .replace::<R>(id, draft)
        .map_err(map_store_error_to_router_error)?;
    build_json_response(200, &record)
}

/// Merges the supplied fields into a record.
///
/// # Endpoint
/// `PATCH /{resource}/{id}`
///
/// # Response
/// - **200 OK**: the updated record
///
/// # Errors
/// - **404 Not Found**: unknown id (checked before the body)
/// - **400 Bad Request**: invalid body or dangling reference
///
/// # Example
/// ```bash
/// curl -X PATCH http://localhost:3000/courses/1 \
///   -H "Content-Type: application/json" \
///   -d '{"teacher": "New Teacher"}'
/// ```
pub fn merge_record<R: Record>(
    state: &AppState,
    id: &str,
    body: &Bytes,
) -> Result<Response<Bytes>, RouterError> {
    ensure_exists::<R>(state, id)?;
    let patch = decode_patch::<R>(body).map_err(map_store_error_to_router_error)?;
    let record = state
        .store
        .merge::<R>(id, patch)
        .map_err(map_store_error_to_router_error)?;
    build_json_response(200, &record)
}

/// Deletes a record.
///
/// # Endpoint
/// `DELETE /{resource}/{id}`
///
/// # Response
/// - **204 No Content**
///
/// # Errors
/// - **404 Not Found**: unknown or already deleted id
pub fn delete_record<R: Record>(state: &AppState, id: &str) -> Result<Response<Bytes>, RouterError> {
    state
        .store
        .delete::<R>(id)
        .map_err(map_store_error_to_router_error)?;
    build_empty_response(204)
}

/// Lists the enrollments of a student or course.
///
/// # Endpoint
/// `GET /students/{id}/enrollments`, `GET /courses/{id}/enrollments`
pub fn list_enrollments_of(
    state: &AppState,
    parent: ResourceKind,
    id: &str,
    query: Option<&str>,
) -> Result<Response<Bytes>, RouterError> {
    let foreign_key = match parent {
        ResourceKind::Students => "studentId",
        ResourceKind::Courses => "courseId",
        ResourceKind::Enrollments => {
            return Err(RouterError::NotFound(format!(
                "No route found for /{}/{}/enrollments",
                parent, id
            )))
        }
    };

    let exists = state
        .store
        .contains(parent, id)
        .map_err(map_store_error_to_router_error)?;
    if !exists {
        return Err(RouterError::NotFound(format!(
            "{} '{}' not found",
            parent.singular(),
            id
        )));
    }

    let mut filters = parse_query_filters(query);
    filters.retain(|(field, _)| field != foreign_key);
    filters.push((foreign_key.to_string(), id.to_string()));

    let records = state
        .store
        .list_matching::<Enrollment>(&filters)
        .map_err(map_store_error_to_router_error)?;
    build_json_response(200, &records)
}

/// Returns the whole database.
///
/// # Endpoint
/// `GET /db`
pub fn database_snapshot(state: &AppState) -> Result<Response<Bytes>, RouterError> {
    let mut snapshot = state
        .store
        .snapshot()
        .map_err(map_store_error_to_router_error)?;
    snapshot.next_ids = None;
    build_json_response(200, &snapshot)
}
