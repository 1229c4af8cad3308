//! Convert bound JSON values to types that sqlx and rusqlite can bind.

use super::BoundParam;
use crate::error::CrudError;
use crate::schema::FieldKind;
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};

/// A value that can be bound to a PostgreSQL query. Nulls keep the column kind so the server sees the right type.
#[derive(Clone, Debug)]
pub enum PgBindValue {
    Null(FieldKind),
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Uuid(uuid::Uuid),
    DateTime(chrono::DateTime<chrono::Utc>),
    Json(Value),
}

fn bind_error(param: &BoundParam) -> CrudError {
    CrudError::Internal(format!(
        "cannot bind {} as {}",
        param.value,
        param.kind.as_str()
    ))
}

impl PgBindValue {
    pub fn from_param(param: &BoundParam) -> Result<Self, CrudError> {
        let v = &param.value;
        if v.is_null() {
            return Ok(PgBindValue::Null(param.kind));
        }
        Ok(match param.kind {
            FieldKind::Integer => PgBindValue::I64(v.as_i64().ok_or_else(|| bind_error(param))?),
            FieldKind::Float => PgBindValue::F64(v.as_f64().ok_or_else(|| bind_error(param))?),
            FieldKind::Boolean => PgBindValue::Bool(v.as_bool().ok_or_else(|| bind_error(param))?),
            FieldKind::String => PgBindValue::String(v.as_str().ok_or_else(|| bind_error(param))?.to_string()),
            FieldKind::Uuid => PgBindValue::Uuid(
                v.as_str()
                    .and_then(|s| uuid::Uuid::parse_str(s).ok())
                    .ok_or_else(|| bind_error(param))?,
            ),
            FieldKind::DateTime => PgBindValue::DateTime(
                v.as_str()
                    .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                    .map(|d| d.with_timezone(&chrono::Utc))
                    .ok_or_else(|| bind_error(param))?,
            ),
            FieldKind::Json => PgBindValue::Json(v.clone()),
        })
    }
}

fn pg_type_for(kind: FieldKind) -> PgTypeInfo {
    match kind {
        FieldKind::Integer => <i64 as Type<Postgres>>::type_info(),
        FieldKind::Float => <f64 as Type<Postgres>>::type_info(),
        FieldKind::String => <String as Type<Postgres>>::type_info(),
        FieldKind::Boolean => <bool as Type<Postgres>>::type_info(),
        FieldKind::Uuid => <uuid::Uuid as Type<Postgres>>::type_info(),
        FieldKind::DateTime => <chrono::DateTime<chrono::Utc> as Type<Postgres>>::type_info(),
        FieldKind::Json => <Value as Type<Postgres>>::type_info(),
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        match self {
            PgBindValue::Null(_) => Ok(IsNull::Yes),
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf),
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf),
            PgBindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf),
            PgBindValue::String(s) => <String as Encode<Postgres>>::encode_by_ref(s, buf),
            PgBindValue::Uuid(u) => <uuid::Uuid as Encode<Postgres>>::encode_by_ref(u, buf),
            PgBindValue::DateTime(d) => {
                <chrono::DateTime<chrono::Utc> as Encode<Postgres>>::encode_by_ref(d, buf)
            }
            PgBindValue::Json(v) => <Value as Encode<Postgres>>::encode_by_ref(v, buf),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            PgBindValue::Null(kind) => pg_type_for(*kind),
            PgBindValue::Bool(_) => pg_type_for(FieldKind::Boolean),
            PgBindValue::I64(_) => pg_type_for(FieldKind::Integer),
            PgBindValue::F64(_) => pg_type_for(FieldKind::Float),
            PgBindValue::String(_) => pg_type_for(FieldKind::String),
            PgBindValue::Uuid(_) => pg_type_for(FieldKind::Uuid),
            PgBindValue::DateTime(_) => pg_type_for(FieldKind::DateTime),
            PgBindValue::Json(_) => pg_type_for(FieldKind::Json),
        })
    }
}

impl Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

/// SQLite storage value for one param. Booleans are 0/1, uuids and datetimes are text, json is serialized text.
pub fn sqlite_value(param: &BoundParam) -> Result<rusqlite::types::Value, CrudError> {
    use rusqlite::types::Value as Sql;
    let v = &param.value;
    if v.is_null() {
        return Ok(Sql::Null);
    }
    Ok(match param.kind {
        FieldKind::Integer => Sql::Integer(v.as_i64().ok_or_else(|| bind_error(param))?),
        FieldKind::Float => Sql::Real(v.as_f64().ok_or_else(|| bind_error(param))?),
        FieldKind::Boolean => Sql::Integer(i64::from(v.as_bool().ok_or_else(|| bind_error(param))?)),
        FieldKind::String | FieldKind::Uuid | FieldKind::DateTime => {
            Sql::Text(v.as_str().ok_or_else(|| bind_error(param))?.to_string())
        }
        FieldKind::Json => Sql::Text(v.to_string()),
    })
}
