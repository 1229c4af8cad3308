//! SQLite backend over a rusqlite connection; statements run on the blocking pool.

use super::{from_row, prepare_key, validate_table, CrudBackend, DbDriver};
use crate::error::{ConfigError, CrudError, KEY_EXISTS_DETAIL};
use crate::migration::create_table_sql;
use crate::pagination::Pagination;
use crate::schema::{FieldKind, PkType, Schema, SchemaDescriptor};
use crate::sql::{self, sqlite_value, Dialect, QueryBuf, Table};
use async_trait::async_trait;
use rusqlite::types::{Type, ValueRef};
use rusqlite::{params_from_iter, Connection, Row};
use serde_json::{Map, Value};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Connection handle that several backends (one per table) can share.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Open a SQLite database file with foreign keys enforced.
pub fn open_connection(path: impl AsRef<Path>) -> Result<SharedConnection, CrudError> {
    let conn = Connection::open(path.as_ref())?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    tracing::info!(path = %path.as_ref().display(), "sqlite opened");
    Ok(Arc::new(Mutex::new(conn)))
}

/// Open a private in-memory SQLite database.
pub fn open_in_memory() -> Result<SharedConnection, CrudError> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub struct SqliteBackend<S> {
    conn: SharedConnection,
    table: Arc<str>,
    schema: Arc<SchemaDescriptor>,
    pk_type: PkType,
    driver: DbDriver,
    _schema: PhantomData<fn() -> S>,
}

impl<S: Schema> SqliteBackend<S> {
    /// Serve `S` from `table` on `conn`. Table and field names must be plain identifiers.
    pub fn new(conn: SharedConnection, table: impl Into<String>) -> Result<Self, ConfigError> {
        let table: String = table.into();
        let schema = S::descriptor();
        validate_table(&table, &schema)?;
        let pk_type = schema.pk_type()?;
        Ok(SqliteBackend {
            conn,
            table: Arc::from(table),
            schema: Arc::new(schema),
            pk_type,
            driver: DbDriver::Sqlite,
            _schema: PhantomData,
        })
    }

    pub fn with_driver(mut self, driver: DbDriver) -> Self {
        self.driver = driver;
        self
    }

    /// Create the backing table if it does not exist.
    pub async fn ensure_table(&self) -> Result<(), CrudError> {
        let ddl = create_table_sql(Dialect::Sqlite, &self.table, &self.schema);
        tracing::debug!(sql = %ddl, "ensure table");
        self.run(move |conn| {
            conn.execute(&ddl, [])?;
            Ok(())
        })
        .await
    }

    fn table(&self) -> Table<'_> {
        Table::new(Dialect::Sqlite, &self.table, &self.schema)
    }

    /// Run `f` with the locked connection on the blocking pool.
    async fn run<T, F>(&self, f: F) -> Result<T, CrudError>
    where
        F: FnOnce(&Connection) -> Result<T, CrudError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| CrudError::Internal("sqlite connection lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| CrudError::Internal(format!("sqlite task failed: {}", e)))?
    }

    async fn fetch(&self, q: QueryBuf) -> Result<Vec<S>, CrudError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let schema = Arc::clone(&self.schema);
        let rows = self
            .run(move |conn| query_rows(conn, &q, &schema))
            .await?;
        rows.into_iter().map(from_row).collect()
    }

    async fn execute(&self, q: QueryBuf) -> Result<usize, CrudError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let driver = self.driver;
        self.run(move |conn| {
            let values = bind_values(&q)?;
            conn.execute(&q.sql, params_from_iter(values.iter()))
                .map_err(|e| driver.classify_rusqlite(e, KEY_EXISTS_DETAIL))
        })
        .await
    }
}

fn bind_values(q: &QueryBuf) -> Result<Vec<rusqlite::types::Value>, CrudError> {
    q.params.iter().map(sqlite_value).collect()
}

fn query_rows(conn: &Connection, q: &QueryBuf, schema: &SchemaDescriptor) -> Result<Vec<Value>, CrudError> {
    let values = bind_values(q)?;
    let mut stmt = conn.prepare(&q.sql)?;
    let mut rows = stmt.query(params_from_iter(values.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(row_to_json(row, schema)?);
    }
    Ok(out)
}

#[async_trait]
impl<S: Schema> CrudBackend<S> for SqliteBackend<S> {
    fn descriptor(&self) -> &SchemaDescriptor {
        &self.schema
    }

    fn default_prefix(&self) -> String {
        self.table.to_string()
    }

    async fn list(&self, page: Pagination) -> Result<Vec<S>, CrudError> {
        self.fetch(sql::select_list(&self.table(), page)).await
    }

    async fn get_one(&self, id: &Value) -> Result<S, CrudError> {
        self.fetch(sql::select_by_id(&self.table(), id))
            .await?
            .into_iter()
            .next()
            .ok_or(CrudError::NotFound)
    }

    async fn create(&self, mut body: Map<String, Value>) -> Result<S, CrudError> {
        prepare_key(&self.schema, self.pk_type, &mut body)?;
        let q = sql::insert(&self.table(), &body);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let schema = Arc::clone(&self.schema);
        let driver = self.driver;
        let row = self
            .run(move |conn| {
                let values = bind_values(&q)?;
                let mut stmt = conn.prepare(&q.sql)?;
                let mut rows = stmt
                    .query(params_from_iter(values.iter()))
                    .map_err(|e| driver.classify_rusqlite(e, KEY_EXISTS_DETAIL))?;
                let first = rows.next().map_err(|e| driver.classify_rusqlite(e, KEY_EXISTS_DETAIL))?;
                let value = match first {
                    Some(row) => row_to_json(row, &schema)?,
                    None => return Err(CrudError::Internal("insert returned no row".into())),
                };
                Ok(value)
            })
            .await?;
        from_row(row)
    }

    async fn update(&self, id: &Value, body: Map<String, Value>) -> Result<S, CrudError> {
        if let Some(q) = sql::update(&self.table(), id, &body) {
            self.execute(q).await?;
        }
        self.get_one(id).await
    }

    async fn delete_one(&self, id: &Value) -> Result<S, CrudError> {
        let record = self.get_one(id).await?;
        self.execute(sql::delete_by_id(&self.table(), id)).await?;
        Ok(record)
    }

    async fn delete_all(&self) -> Result<Vec<S>, CrudError> {
        let removed = self.execute(sql::delete_all(&self.table())).await?;
        tracing::info!(table = %self.table, removed, "deleted all rows");
        self.list(Pagination::all()).await
    }
}

/// Decode the descriptor's columns (selected in descriptor order) into a JSON object.
fn row_to_json(row: &Row<'_>, schema: &SchemaDescriptor) -> Result<Value, rusqlite::Error> {
    let mut map = Map::new();
    for (idx, f) in schema.fields.iter().enumerate() {
        map.insert(f.name.clone(), cell_to_value(row, idx, &f.name, f.kind)?);
    }
    Ok(Value::Object(map))
}

fn cell_to_value(row: &Row<'_>, idx: usize, name: &str, kind: FieldKind) -> Result<Value, rusqlite::Error> {
    let cell = row.get_ref(idx)?;
    let text = |bytes: &[u8]| {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    };
    Ok(match (kind, cell) {
        (_, ValueRef::Null) => Value::Null,
        (FieldKind::Integer, ValueRef::Integer(n)) => Value::from(n),
        (FieldKind::Float, ValueRef::Real(f)) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        (FieldKind::Float, ValueRef::Integer(n)) => Value::from(n as f64),
        (FieldKind::Boolean, ValueRef::Integer(n)) => Value::Bool(n != 0),
        (FieldKind::String | FieldKind::Uuid | FieldKind::DateTime, ValueRef::Text(t)) => Value::String(text(t)?),
        (FieldKind::Json, ValueRef::Text(t)) => serde_json::from_slice(t)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))?,
        (_, other) => {
            return Err(rusqlite::Error::InvalidColumnType(idx, name.to_string(), other.data_type()))
        }
    })
}
