//! Schema descriptors, create/update derivation, and body validation.

mod descriptor;
mod factory;
mod validation;

pub use descriptor::*;
pub use factory::*;
pub use validation::BodyValidator;

use crate::error::{CrudError, ValidationIssue};
use serde_json::Value;

/// Parse a path id according to the primary key type.
pub fn parse_id(id_str: &str, pk_type: PkType) -> Result<Value, CrudError> {
    let invalid = |what: &str, kind: &str| {
        CrudError::validation(ValidationIssue::new(
            "path",
            "item_id",
            format!("value is not a valid {}", what),
            kind,
        ))
    };
    Ok(match pk_type {
        PkType::Int => {
            let n: i64 = id_str.parse().map_err(|_| invalid("integer", "type_error.integer"))?;
            Value::Number(n.into())
        }
        PkType::Uuid => {
            let u = uuid::Uuid::parse_str(id_str).map_err(|_| invalid("uuid", "type_error.uuid"))?;
            Value::String(u.to_string())
        }
        PkType::Text => Value::String(id_str.to_string()),
    })
}

/// Primary key value of a stored record.
pub fn record_pk<S: Schema>(record: &S, pk_field: &str) -> Result<Value, CrudError> {
    match serde_json::to_value(record)? {
        Value::Object(mut m) => Ok(m.remove(pk_field).unwrap_or(Value::Null)),
        _ => Err(CrudError::Internal("record does not serialize to an object".into())),
    }
}
