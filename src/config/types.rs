//! Router configuration as read from JSON or the environment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The six generated operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrudOperation {
    GetAll,
    GetOne,
    Create,
    Update,
    DeleteOne,
    DeleteAll,
}

impl CrudOperation {
    pub const ALL: [CrudOperation; 6] = [
        CrudOperation::GetAll,
        CrudOperation::GetOne,
        CrudOperation::Create,
        CrudOperation::Update,
        CrudOperation::DeleteOne,
        CrudOperation::DeleteAll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrudOperation::GetAll => "get_all",
            CrudOperation::GetOne => "get_one",
            CrudOperation::Create => "create",
            CrudOperation::Update => "update",
            CrudOperation::DeleteOne => "delete_one",
            CrudOperation::DeleteAll => "delete_all",
        }
    }

    /// Operations served on `/{prefix}/{item_id}` rather than `/{prefix}`.
    pub fn is_item_route(&self) -> bool {
        matches!(self, CrudOperation::GetOne | CrudOperation::Update | CrudOperation::DeleteOne)
    }
}

impl fmt::Display for CrudOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrudOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CrudOperation::ALL
            .into_iter()
            .find(|op| op.as_str() == s.trim())
            .ok_or_else(|| format!("unknown route '{}'", s.trim()))
    }
}

fn enabled() -> bool {
    true
}

/// Per-operation on/off switches; every route is on unless turned off.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteToggles {
    #[serde(default = "enabled")]
    pub get_all: bool,
    #[serde(default = "enabled")]
    pub get_one: bool,
    #[serde(default = "enabled")]
    pub create: bool,
    #[serde(default = "enabled")]
    pub update: bool,
    #[serde(default = "enabled")]
    pub delete_one: bool,
    #[serde(default = "enabled")]
    pub delete_all: bool,
}

impl Default for RouteToggles {
    fn default() -> Self {
        RouteToggles {
            get_all: true,
            get_one: true,
            create: true,
            update: true,
            delete_one: true,
            delete_all: true,
        }
    }
}

impl RouteToggles {
    fn slot(&mut self, op: CrudOperation) -> &mut bool {
        match op {
            CrudOperation::GetAll => &mut self.get_all,
            CrudOperation::GetOne => &mut self.get_one,
            CrudOperation::Create => &mut self.create,
            CrudOperation::Update => &mut self.update,
            CrudOperation::DeleteOne => &mut self.delete_one,
            CrudOperation::DeleteAll => &mut self.delete_all,
        }
    }

    pub fn is_enabled(&self, op: CrudOperation) -> bool {
        match op {
            CrudOperation::GetAll => self.get_all,
            CrudOperation::GetOne => self.get_one,
            CrudOperation::Create => self.create,
            CrudOperation::Update => self.update,
            CrudOperation::DeleteOne => self.delete_one,
            CrudOperation::DeleteAll => self.delete_all,
        }
    }

    pub fn disable(&mut self, op: CrudOperation) {
        *self.slot(op) = false;
    }
}

/// Shared settings for one generated resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// URL prefix; the backend's default prefix when absent.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Maximum page size for the list route.
    #[serde(default)]
    pub paginate: Option<u32>,
    /// Request body limit in bytes.
    #[serde(default)]
    pub body_limit: Option<usize>,
    #[serde(default)]
    pub routes: RouteToggles,
}
