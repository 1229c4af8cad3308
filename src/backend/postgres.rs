//! PostgreSQL backend over a sqlx pool.

use super::{from_row, prepare_key, validate_table, CrudBackend, DbDriver};
use crate::error::{ConfigError, CrudError, KEY_EXISTS_DETAIL};
use crate::migration::create_table_sql;
use crate::pagination::Pagination;
use crate::schema::{FieldKind, PkType, Schema, SchemaDescriptor};
use crate::sql::{self, Dialect, PgBindValue, QueryBuf, Table};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgPool, PgRow};
use sqlx::query::Query;
use sqlx::Postgres;
use std::marker::PhantomData;

pub struct PgBackend<S> {
    pool: PgPool,
    table: String,
    schema: SchemaDescriptor,
    pk_type: PkType,
    driver: DbDriver,
    _schema: PhantomData<fn() -> S>,
}

impl<S: Schema> PgBackend<S> {
    /// Serve `S` from `table`. Table and field names must be plain identifiers.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Result<Self, ConfigError> {
        let table = table.into();
        let schema = S::descriptor();
        validate_table(&table, &schema)?;
        let pk_type = schema.pk_type()?;
        Ok(PgBackend {
            pool,
            table,
            schema,
            pk_type,
            driver: DbDriver::Postgres,
            _schema: PhantomData,
        })
    }

    /// Override the driver used to recognize integrity violations (e.g. a Postgres-compatible server
    /// reporting non-standard codes can be set to `Unknown`).
    pub fn with_driver(mut self, driver: DbDriver) -> Self {
        self.driver = driver;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the backing table if it does not exist.
    pub async fn ensure_table(&self) -> Result<(), CrudError> {
        let ddl = create_table_sql(Dialect::Postgres, &self.table, &self.schema);
        tracing::debug!(sql = %ddl, "ensure table");
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    fn table(&self) -> Table<'_> {
        Table::new(Dialect::Postgres, &self.table, &self.schema)
    }

    fn decode(&self, row: &PgRow) -> Result<S, CrudError> {
        from_row(row_to_json(row, &self.schema)?)
    }

    async fn fetch_many(&self, q: &QueryBuf) -> Result<Vec<S>, CrudError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_query(q)?.fetch_all(&self.pool).await?;
        rows.iter().map(|r| self.decode(r)).collect()
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<S>, CrudError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_query(q)?.fetch_optional(&self.pool).await?;
        row.as_ref().map(|r| self.decode(r)).transpose()
    }

    async fn execute(&self, q: &QueryBuf) -> Result<u64, CrudError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let done = bind_query(q)?
            .execute(&self.pool)
            .await
            .map_err(|e| self.driver.classify_sqlx(e, KEY_EXISTS_DETAIL))?;
        Ok(done.rows_affected())
    }
}

fn bind_query(q: &QueryBuf) -> Result<Query<'_, Postgres, PgArguments>, CrudError> {
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(PgBindValue::from_param(p)?);
    }
    Ok(query)
}

#[async_trait]
impl<S: Schema> CrudBackend<S> for PgBackend<S> {
    fn descriptor(&self) -> &SchemaDescriptor {
        &self.schema
    }

    fn default_prefix(&self) -> String {
        self.table.clone()
    }

    async fn list(&self, page: Pagination) -> Result<Vec<S>, CrudError> {
        self.fetch_many(&sql::select_list(&self.table(), page)).await
    }

    async fn get_one(&self, id: &Value) -> Result<S, CrudError> {
        self.fetch_optional(&sql::select_by_id(&self.table(), id))
            .await?
            .ok_or(CrudError::NotFound)
    }

    async fn create(&self, mut body: Map<String, Value>) -> Result<S, CrudError> {
        prepare_key(&self.schema, self.pk_type, &mut body)?;
        let q = sql::insert(&self.table(), &body);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_query(&q)?
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| self.driver.classify_sqlx(e, KEY_EXISTS_DETAIL))?
            .ok_or_else(|| CrudError::Internal("insert returned no row".into()))?;
        self.decode(&row)
    }

    async fn update(&self, id: &Value, body: Map<String, Value>) -> Result<S, CrudError> {
        if let Some(q) = sql::update(&self.table(), id, &body) {
            self.execute(&q).await?;
        }
        self.get_one(id).await
    }

    async fn delete_one(&self, id: &Value) -> Result<S, CrudError> {
        let record = self.get_one(id).await?;
        self.execute(&sql::delete_by_id(&self.table(), id)).await?;
        Ok(record)
    }

    async fn delete_all(&self) -> Result<Vec<S>, CrudError> {
        let removed = self.execute(&sql::delete_all(&self.table())).await?;
        tracing::info!(table = %self.table, removed, "deleted all rows");
        self.list(Pagination::all()).await
    }
}

/// Decode the descriptor's columns into a JSON object.
fn row_to_json(row: &PgRow, schema: &SchemaDescriptor) -> Result<Value, CrudError> {
    let mut map = Map::new();
    for f in &schema.fields {
        map.insert(f.name.clone(), cell_to_value(row, &f.name, f.kind)?);
    }
    Ok(Value::Object(map))
}

fn cell_to_value(row: &PgRow, name: &str, kind: FieldKind) -> Result<Value, sqlx::Error> {
    use sqlx::Row;
    let v = match kind {
        FieldKind::Integer => {
            if let Ok(v) = row.try_get::<Option<i64>, _>(name) {
                v.map(Value::from)
            } else if let Ok(v) = row.try_get::<Option<i32>, _>(name) {
                v.map(Value::from)
            } else {
                row.try_get::<Option<i16>, _>(name)?.map(Value::from)
            }
        }
        FieldKind::Float => {
            let n = if let Ok(v) = row.try_get::<Option<f64>, _>(name) {
                v
            } else {
                row.try_get::<Option<f32>, _>(name)?.map(f64::from)
            };
            n.and_then(serde_json::Number::from_f64).map(Value::Number)
        }
        FieldKind::String => row.try_get::<Option<String>, _>(name)?.map(Value::String),
        FieldKind::Boolean => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
        FieldKind::Uuid => row
            .try_get::<Option<uuid::Uuid>, _>(name)?
            .map(|u| Value::String(u.to_string())),
        FieldKind::DateTime => {
            if let Ok(v) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
                v.map(|d| Value::String(d.to_rfc3339()))
            } else {
                row.try_get::<Option<chrono::NaiveDateTime>, _>(name)?
                    .map(|d| Value::String(d.and_utc().to_rfc3339()))
            }
        }
        FieldKind::Json => row.try_get::<Option<Value>, _>(name)?,
    };
    Ok(v.unwrap_or(Value::Null))
}
