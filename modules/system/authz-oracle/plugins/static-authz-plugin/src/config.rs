//! Configuration for the static authorization oracle.

use serde::{Deserialize, Serialize};

/// Plugin configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticAuthZPluginConfig {
    /// Authorization mode.
    pub mode: AuthZMode,
}

/// Authorization mode.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthZMode {
    /// Superuser, organization roles and per-record grants.
    #[default]
    RoleHierarchy,
    /// Allow everything.
    AllowAll,
}
