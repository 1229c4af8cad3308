//! In-process backend: an ordered list of records plus a next-id counter.
//!
//! Not shared across processes. Lookups are linear scans by primary key, which is fine for a
//! reference or test backend.

use super::{from_row, CrudBackend};
use crate::error::{ConfigError, CrudError};
use crate::pagination::Pagination;
use crate::schema::{record_pk, PkType, Schema, SchemaDescriptor};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

struct MemoryStore<S> {
    models: Vec<S>,
    /// Next id to hand out. Starts at 1 and only grows, so ids are never reused.
    next_id: i64,
}

pub struct MemoryBackend<S: Schema> {
    schema: SchemaDescriptor,
    store: RwLock<MemoryStore<S>>,
}

impl<S: Schema> MemoryBackend<S> {
    /// Requires an integer primary key.
    pub fn new() -> Result<Self, ConfigError> {
        let schema = S::descriptor();
        let pk_type = schema.pk_type()?;
        if pk_type != PkType::Int {
            return Err(ConfigError::UnsupportedPrimaryKey {
                backend: "memory",
                pk_type: pk_type.as_str(),
            });
        }
        Ok(MemoryBackend {
            schema,
            store: RwLock::new(MemoryStore {
                models: Vec::new(),
                next_id: 1,
            }),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStore<S>>, CrudError> {
        self.store
            .read()
            .map_err(|_| CrudError::Internal("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStore<S>>, CrudError> {
        self.store
            .write()
            .map_err(|_| CrudError::Internal("memory store lock poisoned".into()))
    }

    fn position(&self, models: &[S], id: &Value) -> Result<Option<usize>, CrudError> {
        for (i, m) in models.iter().enumerate() {
            if record_pk(m, &self.schema.pk_field)? == *id {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl<S: Schema> CrudBackend<S> for MemoryBackend<S> {
    fn descriptor(&self) -> &SchemaDescriptor {
        &self.schema
    }

    fn default_prefix(&self) -> String {
        self.schema.name.to_lowercase()
    }

    async fn list(&self, page: Pagination) -> Result<Vec<S>, CrudError> {
        let store = self.read()?;
        Ok(page.window(&store.models).to_vec())
    }

    async fn get_one(&self, id: &Value) -> Result<S, CrudError> {
        let store = self.read()?;
        let idx = self.position(&store.models, id)?.ok_or(CrudError::NotFound)?;
        Ok(store.models[idx].clone())
    }

    async fn create(&self, mut body: Map<String, Value>) -> Result<S, CrudError> {
        let mut store = self.write()?;
        let id = store.next_id;
        body.insert(self.schema.pk_field.clone(), Value::from(id));
        let record: S = from_row(Value::Object(body))?;
        store.next_id += 1;
        store.models.push(record.clone());
        tracing::debug!(schema = %self.schema.name, id, "memory create");
        Ok(record)
    }

    async fn update(&self, id: &Value, body: Map<String, Value>) -> Result<S, CrudError> {
        let mut store = self.write()?;
        let idx = self.position(&store.models, id)?.ok_or(CrudError::NotFound)?;
        let mut merged = match serde_json::to_value(&store.models[idx])? {
            Value::Object(m) => m,
            _ => return Err(CrudError::Internal("record does not serialize to an object".into())),
        };
        for (k, v) in body {
            if k != self.schema.pk_field {
                merged.insert(k, v);
            }
        }
        merged.insert(self.schema.pk_field.clone(), id.clone());
        let record: S = from_row(Value::Object(merged))?;
        store.models[idx] = record.clone();
        Ok(record)
    }

    async fn delete_one(&self, id: &Value) -> Result<S, CrudError> {
        let mut store = self.write()?;
        let idx = self.position(&store.models, id)?.ok_or(CrudError::NotFound)?;
        Ok(store.models.remove(idx))
    }

    async fn delete_all(&self) -> Result<Vec<S>, CrudError> {
        let mut store = self.write()?;
        store.models.clear();
        Ok(store.models.clone())
    }
}
