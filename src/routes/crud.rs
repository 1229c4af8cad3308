//! Builder that mounts the six CRUD routes of one schema on an axum router.
//!
//! Collection routes live on `/{prefix}`, item routes on `/{prefix}/:item_id`. A path is only
//! registered when at least one of its operations is enabled.

use crate::backend::CrudBackend;
use crate::config::{normalize_prefix, CrudOperation, RouterConfig};
use crate::error::ConfigError;
use crate::handlers::crud as h;
use crate::routes::guard::{run_guards, RouteSetting};
use crate::schema::{default_create_schema, derive_update_schema, Schema, SchemaDescriptor};
use crate::state::ResourceState;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put, MethodRouter},
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

pub struct CrudRouter<S: Schema> {
    backend: Arc<dyn CrudBackend<S>>,
    prefix: Option<String>,
    paginate: Option<u32>,
    body_limit: Option<usize>,
    create_schema: Option<SchemaDescriptor>,
    update_schema: Option<SchemaDescriptor>,
    settings: HashMap<CrudOperation, RouteSetting>,
}

impl<S: Schema> CrudRouter<S> {
    pub fn new<B: CrudBackend<S>>(backend: B) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    pub fn from_arc(backend: Arc<dyn CrudBackend<S>>) -> Self {
        CrudRouter {
            backend,
            prefix: None,
            paginate: None,
            body_limit: None,
            create_schema: None,
            update_schema: None,
            settings: HashMap::new(),
        }
    }

    /// Apply a loaded config. Routes turned off there become `Disabled`; the others keep their setting.
    pub fn with_config(mut self, config: &RouterConfig) -> Self {
        if let Some(prefix) = &config.prefix {
            self.prefix = Some(prefix.clone());
        }
        if config.paginate.is_some() {
            self.paginate = config.paginate;
        }
        if config.body_limit.is_some() {
            self.body_limit = config.body_limit;
        }
        for op in CrudOperation::ALL {
            if !config.routes.is_enabled(op) {
                self.settings.insert(op, RouteSetting::Disabled);
            }
        }
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Maximum page size for the list route; also its default limit.
    pub fn paginate(mut self, max_limit: u32) -> Self {
        self.paginate = Some(max_limit);
        self
    }

    pub fn body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = Some(bytes);
        self
    }

    pub fn create_schema(mut self, schema: SchemaDescriptor) -> Self {
        self.create_schema = Some(schema);
        self
    }

    pub fn update_schema(mut self, schema: SchemaDescriptor) -> Self {
        self.update_schema = Some(schema);
        self
    }

    pub fn route(mut self, op: CrudOperation, setting: RouteSetting) -> Self {
        self.settings.insert(op, setting);
        self
    }

    pub fn get_all_route(self, setting: RouteSetting) -> Self {
        self.route(CrudOperation::GetAll, setting)
    }

    pub fn get_one_route(self, setting: RouteSetting) -> Self {
        self.route(CrudOperation::GetOne, setting)
    }

    pub fn create_route(self, setting: RouteSetting) -> Self {
        self.route(CrudOperation::Create, setting)
    }

    pub fn update_route(self, setting: RouteSetting) -> Self {
        self.route(CrudOperation::Update, setting)
    }

    pub fn delete_one_route(self, setting: RouteSetting) -> Self {
        self.route(CrudOperation::DeleteOne, setting)
    }

    pub fn delete_all_route(self, setting: RouteSetting) -> Self {
        self.route(CrudOperation::DeleteAll, setting)
    }

    fn method_router(op: CrudOperation) -> MethodRouter<ResourceState<S>> {
        match op {
            CrudOperation::GetAll => get(h::list::<S>),
            CrudOperation::GetOne => get(h::read::<S>),
            CrudOperation::Create => post(h::create::<S>),
            CrudOperation::Update => put(h::update::<S>),
            CrudOperation::DeleteOne => delete(h::delete_one::<S>),
            CrudOperation::DeleteAll => delete(h::delete_all::<S>),
        }
    }

    /// Merge the enabled operations of one path; `None` when all of them are disabled.
    fn path_router(&self, ops: &[CrudOperation]) -> Option<MethodRouter<ResourceState<S>>> {
        let mut merged: Option<MethodRouter<ResourceState<S>>> = None;
        for op in ops {
            let method = match self.settings.get(op).cloned().unwrap_or_default() {
                RouteSetting::Disabled => continue,
                RouteSetting::Enabled => Self::method_router(*op),
                RouteSetting::Guarded(guards) => Self::method_router(*op)
                    .route_layer(middleware::from_fn_with_state(Arc::new(guards), run_guards)),
            };
            merged = Some(match merged {
                Some(m) => m.merge(method),
                None => method,
            });
        }
        merged
    }

    /// Validate the configuration and produce the router.
    pub fn build(self) -> Result<Router, ConfigError> {
        let schema = self.backend.descriptor().clone();
        let pk_type = schema.pk_type()?;
        if self.paginate == Some(0) {
            return Err(ConfigError::Validation("paginate must be greater than zero".into()));
        }
        if self.body_limit == Some(0) {
            return Err(ConfigError::Validation("body_limit must be greater than zero".into()));
        }
        let prefix = match &self.prefix {
            Some(p) => normalize_prefix(p)?,
            None => normalize_prefix(&self.backend.default_prefix())?,
        };
        let create_schema = self
            .create_schema
            .clone()
            .unwrap_or_else(|| default_create_schema(&schema, pk_type));
        let update_schema = self
            .update_schema
            .clone()
            .unwrap_or_else(|| derive_update_schema(&schema));

        let state = ResourceState {
            backend: Arc::clone(&self.backend),
            pk_type,
            create_schema: Arc::new(create_schema),
            update_schema: Arc::new(update_schema),
            max_limit: self.paginate,
        };

        let (item_ops, collection_ops): (Vec<CrudOperation>, Vec<CrudOperation>) =
            CrudOperation::ALL.into_iter().partition(CrudOperation::is_item_route);
        let collection_path = if prefix.is_empty() { "/".to_string() } else { prefix.clone() };
        let item_path = format!("{}/:item_id", prefix);

        let mut router: Router<ResourceState<S>> = Router::new();
        if let Some(m) = self.path_router(&collection_ops) {
            router = router.route(&collection_path, m);
        }
        if let Some(m) = self.path_router(&item_ops) {
            router = router.route(&item_path, m);
        }
        let mounted: Vec<&str> = CrudOperation::ALL
            .iter()
            .filter(|op| self.settings.get(*op).map_or(true, RouteSetting::is_enabled))
            .map(CrudOperation::as_str)
            .collect();
        tracing::info!(schema = %schema.name, prefix = %collection_path, routes = ?mounted, "crud routes mounted");

        let mut router = router.with_state(state);
        if let Some(limit) = self.body_limit {
            router = router
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(limit));
        }
        Ok(router)
    }
}
