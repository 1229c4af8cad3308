//! Route builders: generated CRUD resources, guards, and common endpoints.

pub mod common;
pub mod crud;
pub mod guard;

pub use common::common_routes;
pub use crud::CrudRouter;
pub use guard::{require_header, RouteGuard, RouteSetting, SharedGuard};
