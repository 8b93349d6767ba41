use serde_json::{Map, Value};

use crate::error::Error;

/// One server-side resource instance: field name -> JSON value.
pub type Record = Map<String, Value>;

/// Require a JSON object; anything else is a shape error.
pub(crate) fn into_record(value: Value) -> Result<Record, Error> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::shape("expected a JSON object record", &other)),
    }
}

/// Index key of an identity value. Strings are used as-is, numbers by
/// their decimal rendering; other JSON types are not usable as keys.
pub(crate) fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
