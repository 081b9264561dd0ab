//! Request payloads for resource mutations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ScmType;

/// Payload for project create (POST) and full replacement (PUT).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub organization_id: Uuid,
    #[serde(default)]
    pub scm_type: ScmType,
    #[serde(default)]
    pub scm_url: String,
    #[serde(default)]
    pub scm_branch: String,
    #[serde(default)]
    pub scm_clean: bool,
    #[serde(default)]
    pub scm_delete_on_update: bool,
    #[serde(default)]
    pub scm_update_on_launch: bool,
    #[serde(default)]
    pub scm_credential_id: Option<Uuid>,
}

/// Partial project update (PATCH). Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub organization_id: Option<Uuid>,
    pub scm_type: Option<ScmType>,
    pub scm_url: Option<String>,
    pub scm_branch: Option<String>,
    pub scm_clean: Option<bool>,
    pub scm_delete_on_update: Option<bool>,
    pub scm_update_on_launch: Option<bool>,
    pub scm_credential_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub organization_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInventory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub organization_id: Uuid,
    #[serde(default)]
    pub variables: String,
}
