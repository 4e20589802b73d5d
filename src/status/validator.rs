use serde_json::Value;
use tracing::error;

use super::RECORDS_FIELD;
use crate::errors::ValidationError;

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

/// Check the payload shape and extract the record list.
///
/// The list is returned as-is, so it may be empty. Record contents are not
/// inspected here; that is [`super::parse_status`]'s job.
pub fn validate(payload: &Value) -> Result<Vec<Value>, ValidationError> {
    let Some(object) = payload.as_object() else {
        let reason = format!("top level is {}, expected a mapping", kind_of(payload));
        error!("{}", reason);
        return Err(ValidationError::ShapeMismatch(reason));
    };

    match object.get(RECORDS_FIELD) {
        Some(Value::Array(records)) => Ok(records.clone()),
        Some(other) => {
            let reason = format!("'{}' is {}, expected a list", RECORDS_FIELD, kind_of(other));
            error!("{}", reason);
            Err(ValidationError::ShapeMismatch(reason))
        }
        None => {
            let reason = format!("'{}' is missing", RECORDS_FIELD);
            error!("{}", reason);
            Err(ValidationError::ShapeMismatch(reason))
        }
    }
}
