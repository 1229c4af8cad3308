//! Request body validation against a schema descriptor.

use super::descriptor::{FieldDef, FieldKind, SchemaDescriptor};
use crate::error::{CrudError, ValidationIssue};
use serde_json::{Map, Value};

pub struct BodyValidator;

impl BodyValidator {
    /// Validate a create body: every required field present, every value of the right kind.
    /// Returns the body restricted to the descriptor's fields.
    pub fn validate(body: Value, schema: &SchemaDescriptor) -> Result<Map<String, Value>, CrudError> {
        let mut obj = body_object(body)?;
        let mut issues = Vec::new();
        let mut out = Map::new();
        for field in &schema.fields {
            match obj.remove(&field.name) {
                Some(v) => match check_value(field, v) {
                    Ok(v) => {
                        out.insert(field.name.clone(), v);
                    }
                    Err(issue) => issues.push(issue),
                },
                None if field.required => issues.push(ValidationIssue::new(
                    "body",
                    &field.name,
                    "field required",
                    "value_error.missing",
                )),
                None => {}
            }
        }
        finish(out, issues)
    }

    /// Validate only the fields present in body (for updates). Required is not enforced.
    /// The primary key is never part of the result.
    pub fn validate_partial(body: Value, schema: &SchemaDescriptor) -> Result<Map<String, Value>, CrudError> {
        let obj = body_object(body)?;
        let mut issues = Vec::new();
        let mut out = Map::new();
        for (name, v) in obj {
            if name == schema.pk_field {
                continue;
            }
            let Some(field) = schema.get(&name) else { continue };
            match check_value(field, v) {
                Ok(v) => {
                    out.insert(name, v);
                }
                Err(issue) => issues.push(issue),
            }
        }
        finish(out, issues)
    }
}

fn body_object(body: Value) -> Result<Map<String, Value>, CrudError> {
    match body {
        Value::Object(m) => Ok(m),
        _ => Err(CrudError::validation(ValidationIssue {
            loc: vec!["body".into()],
            msg: "value is not a valid dict".into(),
            kind: "type_error.dict".into(),
        })),
    }
}

fn finish(out: Map<String, Value>, issues: Vec<ValidationIssue>) -> Result<Map<String, Value>, CrudError> {
    if issues.is_empty() {
        Ok(out)
    } else {
        Err(CrudError::Validation(issues))
    }
}

/// Check one value against its field and normalize it (uuid and datetime strings are canonicalized).
fn check_value(field: &FieldDef, v: Value) -> Result<Value, ValidationIssue> {
    if v.is_null() {
        if field.nullable {
            return Ok(Value::Null);
        }
        return Err(ValidationIssue::new(
            "body",
            &field.name,
            "none is not an allowed value",
            "type_error.none.not_allowed",
        ));
    }
    let mismatch = |what: &str, kind: &str| {
        ValidationIssue::new("body", &field.name, format!("value is not a valid {}", what), kind)
    };
    match field.kind {
        FieldKind::Integer => {
            if v.is_i64() {
                Ok(v)
            } else {
                Err(mismatch("integer", "type_error.integer"))
            }
        }
        FieldKind::Float => {
            if v.is_number() {
                Ok(v)
            } else {
                Err(mismatch("float", "type_error.float"))
            }
        }
        FieldKind::String => {
            if v.is_string() {
                Ok(v)
            } else {
                Err(mismatch("string", "type_error.str"))
            }
        }
        FieldKind::Boolean => {
            if v.is_boolean() {
                Ok(v)
            } else {
                Err(mismatch("boolean", "type_error.bool"))
            }
        }
        FieldKind::Uuid => v
            .as_str()
            .and_then(|s| uuid::Uuid::parse_str(s).ok())
            .map(|u| Value::String(u.to_string()))
            .ok_or_else(|| mismatch("uuid", "type_error.uuid")),
        FieldKind::DateTime => v
            .as_str()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|d| Value::String(d.with_timezone(&chrono::Utc).to_rfc3339()))
            .ok_or_else(|| mismatch("datetime", "type_error.datetime")),
        FieldKind::Json => Ok(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item_create() -> SchemaDescriptor {
        SchemaDescriptor::new("ItemCreate")
            .field(FieldDef::string("name"))
            .field(FieldDef::float("price"))
            .field(FieldDef::string("description").nullable())
    }

    fn issues(err: CrudError) -> Vec<ValidationIssue> {
        match err {
            CrudError::Validation(issues) => issues,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn full_body_passes_and_drops_unknown_fields() {
        let body = json!({"name": "Widget", "price": 9.99, "description": null, "colour": "red"});
        let out = BodyValidator::validate(body, &item_create()).unwrap();
        assert_eq!(out.len(), 3);
        assert!(!out.contains_key("colour"));
    }

    #[test]
    fn every_problem_is_reported() {
        let body = json!({"price": "cheap"});
        let found = issues(BodyValidator::validate(body, &item_create()).unwrap_err());
        let locs: Vec<&str> = found.iter().map(|i| i.loc[1].as_str()).collect();
        assert_eq!(locs, vec!["name", "price", "description"]);
        assert_eq!(found[0].kind, "value_error.missing");
        assert_eq!(found[1].kind, "type_error.float");
    }

    #[test]
    fn null_only_where_nullable() {
        let body = json!({"name": null, "price": 1, "description": null});
        let found = issues(BodyValidator::validate(body, &item_create()).unwrap_err());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, "type_error.none.not_allowed");
    }

    #[test]
    fn partial_checks_only_supplied_fields_and_skips_pk() {
        let schema = item_create().with_pk("id");
        let out = BodyValidator::validate_partial(json!({"id": 7, "price": 3}), &schema).unwrap();
        assert_eq!(out, json!({"price": 3}).as_object().unwrap().clone());
    }

    #[test]
    fn integers_outside_i64_are_rejected() {
        let schema = SchemaDescriptor::new("Counter").field(FieldDef::integer("n"));
        let found = issues(BodyValidator::validate(json!({"n": u64::MAX}), &schema).unwrap_err());
        assert_eq!(found[0].loc, vec!["body", "n"]);
        assert_eq!(found[0].msg, "value is not a valid integer");
        assert_eq!(found[0].kind, "type_error.integer");
        assert!(BodyValidator::validate(json!({"n": i64::MAX}), &schema).is_ok());
    }

    #[test]
    fn non_object_body_is_rejected() {
        let found = issues(BodyValidator::validate(json!([1, 2]), &item_create()).unwrap_err());
        assert_eq!(found[0].kind, "type_error.dict");
    }

    #[test]
    fn uuid_and_datetime_are_canonicalized() {
        let schema = SchemaDescriptor::new("Event")
            .field(FieldDef::uuid("ref"))
            .field(FieldDef::datetime("at"));
        let out = BodyValidator::validate(
            json!({"ref": "6F9619FF-8B86-D011-B42D-00C04FC964FF", "at": "2024-05-01T10:00:00+02:00"}),
            &schema,
        )
        .unwrap();
        assert_eq!(out["ref"], json!("6f9619ff-8b86-d011-b42d-00c04fc964ff"));
        assert_eq!(out["at"], json!("2024-05-01T08:00:00+00:00"));
    }
}
