//! Per-resource state shared by the six generated handlers.

use crate::backend::CrudBackend;
use crate::schema::{PkType, Schema, SchemaDescriptor};
use std::sync::Arc;

pub struct ResourceState<S: Schema> {
    pub backend: Arc<dyn CrudBackend<S>>,
    pub pk_type: PkType,
    /// Descriptor create bodies are validated against.
    pub create_schema: Arc<SchemaDescriptor>,
    /// Descriptor update bodies are validated against (partially).
    pub update_schema: Arc<SchemaDescriptor>,
    /// Maximum page size; also the default limit when the client omits one.
    pub max_limit: Option<u32>,
}

impl<S: Schema> Clone for ResourceState<S> {
    fn clone(&self) -> Self {
        ResourceState {
            backend: Arc::clone(&self.backend),
            pk_type: self.pk_type,
            create_schema: Arc::clone(&self.create_schema),
            update_schema: Arc::clone(&self.update_schema),
            max_limit: self.max_limit,
        }
    }
}
