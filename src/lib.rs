//! crud-router: schema-driven CRUD route generation for axum.
//!
//! A [`Schema`] type plus a [`CrudBackend`] (in-memory, PostgreSQL, or SQLite) becomes six routes:
//! list, read, create, update, delete one, and delete all.

pub mod backend;
pub mod config;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod pagination;
pub mod routes;
pub mod schema;
pub mod sql;
pub mod state;

pub use backend::{CrudBackend, DbDriver, MemoryBackend, PgBackend, SqliteBackend};
pub use backend::sqlite::{open_connection, open_in_memory, SharedConnection};
pub use config::{
    load_router_config, router_config_from_env, validate_router_config, CrudOperation, RouteToggles,
    RouterConfig,
};
pub use error::{ConfigError, CrudError, ValidationIssue, KEY_EXISTS_DETAIL, NOT_FOUND_DETAIL};
pub use migration::create_table_sql;
pub use pagination::{validate_pagination, Pagination};
pub use routes::{common_routes, require_header, CrudRouter, RouteGuard, RouteSetting};
pub use schema::{
    derive_create_schema, derive_update_schema, schema_factory, BodyValidator, FieldDef, FieldKind, PkType,
    Schema, SchemaDescriptor,
};
pub use state::ResourceState;
