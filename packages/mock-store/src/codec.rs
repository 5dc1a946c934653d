//! Request body decoding, shape checks, and cross-reference validation.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::record::Record;
use crate::store::Tables;

/// Parses a body that must be a JSON object.
fn parse_object(body: &[u8]) -> Result<Map<String, Value>, StoreError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| StoreError::invalid_body(format!("Malformed JSON body: {}", e)))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::invalid_body(format!(
            "Request body must be a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expect_string(field: &str, value: &Value) -> Result<(), StoreError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(StoreError::invalid_field(
            field,
            format!(
                "Field '{}' must be a string, got {}",
                field,
                json_type_name(value)
            ),
        ))
    }
}

/// Keeps only the record's declared fields; `id` and unknown keys are dropped.
fn known_fields<R: Record>(mut map: Map<String, Value>) -> Map<String, Value> {
    map.retain(|key, _| R::FIELDS.contains(&key.as_str()));
    map
}

/// Decodes a create/replace body.
///
/// Every field in `R::FIELDS` must be present and a string.
pub fn decode_draft<R: Record>(body: &[u8]) -> Result<R::Draft, StoreError> {
    let map = known_fields::<R>(parse_object(body)?);
    for field in R::FIELDS {
        match map.get(*field) {
            Some(value) => expect_string(field, value)?,
            None => {
                return Err(StoreError::invalid_field(
                    field,
                    format!("Missing required field '{}'", field),
                ))
            }
        }
    }
    serde_json::from_value(Value::Object(map))
        .map_err(|e| StoreError::invalid_body(format!("Invalid {}: {}", R::KIND.singular(), e)))
}

/// Decodes a merge body. Supplied known fields must be strings.
pub fn decode_patch<R: Record>(body: &[u8]) -> Result<R::Patch, StoreError> {
    let map = known_fields::<R>(parse_object(body)?);
    for (field, value) in &map {
        expect_string(field, value)?;
    }
    serde_json::from_value(Value::Object(map))
        .map_err(|e| StoreError::invalid_body(format!("Invalid {}: {}", R::KIND.singular(), e)))
}

/// Checks that every foreign key of `record` resolves in `tables`.
pub fn check_references<R: Record>(tables: &Tables, record: &R) -> Result<(), StoreError> {
    for reference in record.references() {
        if !tables.contains(reference.target, reference.id) {
            return Err(StoreError::invalid_field(
                reference.field,
                format!(
                    "{} '{}' referenced by '{}' does not exist",
                    reference.target.singular(),
                    reference.id,
                    reference.field
                ),
            ));
        }
    }
    Ok(())
}

/// Encodes a record (or list, or snapshot) to its wire JSON.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(value).map_err(|e| StoreError::SerializationError(e.to_string()))
}
