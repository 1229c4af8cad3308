//! HTTP handlers for generated CRUD resources.

pub mod crud;
pub use crud::*;
