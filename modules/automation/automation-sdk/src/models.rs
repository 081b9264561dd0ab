//! Resource models of the automation control plane.
//!
//! Every resource embeds its access-control list in `roles`. The list is
//! owned by the record, consulted by the authorization oracle and never
//! serialized to clients.

use std::collections::BTreeMap;
use std::fmt;

use authz_oracle_sdk::Protected;
use chrono::{DateTime, Utc};
use conductor_security::AccessControlEntry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Source-control system backing a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScmType {
    Git,
    Hg,
    Svn,
    #[default]
    Manual,
}

impl ScmType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Hg => "hg",
            Self::Svn => "svn",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for ScmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Successful,
    Failed,
    Canceled,
}

impl JobStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Successful => "successful",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }

    /// Whether the runner will not touch the job again.
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Successful | Self::Failed | Self::Canceled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// SCM synchronization of a project.
    UpdateJob,
    /// Playbook run.
    Run,
}

impl JobType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UpdateJob => "update_job",
            Self::Run => "run",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_by: Uuid,
    pub modified_by: Uuid,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(skip)]
    pub roles: Vec<AccessControlEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub organization_id: Uuid,
    pub created_by: Uuid,
    pub modified_by: Uuid,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(skip)]
    pub roles: Vec<AccessControlEntry>,
}

/// A source-control-backed playbook repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub organization_id: Uuid,
    pub scm_type: ScmType,
    pub scm_url: String,
    pub scm_branch: String,
    pub scm_clean: bool,
    pub scm_delete_on_update: bool,
    pub scm_update_on_launch: bool,
    pub scm_credential_id: Option<Uuid>,
    /// Working directory, `<projects_home>/<id>`.
    pub local_path: String,
    pub status: String,
    pub created_by: Uuid,
    pub modified_by: Uuid,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(skip)]
    pub roles: Vec<AccessControlEntry>,
}

/// Inventory with host and group counters maintained outside this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub organization_id: Uuid,
    pub variables: String,
    pub total_hosts: u32,
    pub hosts_with_active_failures: u32,
    pub total_groups: u32,
    pub has_active_failures: bool,
    pub created_by: Uuid,
    pub modified_by: Uuid,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(skip)]
    pub roles: Vec<AccessControlEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub project_id: Uuid,
    pub inventory_id: Uuid,
    pub playbook: String,
    pub organization_id: Uuid,
    pub created_by: Uuid,
    pub modified_by: Uuid,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(skip)]
    pub roles: Vec<AccessControlEntry>,
}

/// Stored secret reference. Only its existence matters to this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
    pub organization_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created: DateTime<Utc>,
    #[serde(skip)]
    pub roles: Vec<AccessControlEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created: DateTime<Utc>,
}

/// One execution of an SCM sync or playbook run. Written only by the job runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub name: String,
    pub job_type: JobType,
    pub status: JobStatus,
    pub failed: bool,
    pub project_id: Uuid,
    pub organization_id: Uuid,
    pub job_explanation: String,
    pub created_by: Uuid,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub started: Option<DateTime<Utc>>,
    pub finished: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub roles: Vec<AccessControlEntry>,
}

/// Immutable audit entry, one per successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub object_id: Uuid,
    pub object_type: String,
    pub description: String,
    pub created: DateTime<Utc>,
}

/// Outward-facing view of a resource: stored fields plus hypermedia metadata.
///
/// Computed per response and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Representation {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub related: BTreeMap<String, String>,
    pub summary_fields: Map<String, Value>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Paginated list envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: usize,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

macro_rules! org_scoped {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Protected for $ty {
                fn resource_id(&self) -> Uuid {
                    self.id
                }

                fn organization_id(&self) -> Option<Uuid> {
                    Some(self.organization_id)
                }

                fn access_entries(&self) -> &[AccessControlEntry] {
                    &self.roles
                }
            }
        )+
    };
}

org_scoped!(Team, Project, Inventory, JobTemplate, Job);

impl Protected for Organization {
    fn resource_id(&self) -> Uuid {
        self.id
    }

    fn organization_id(&self) -> Option<Uuid> {
        Some(self.id)
    }

    fn access_entries(&self) -> &[AccessControlEntry] {
        &self.roles
    }
}

impl Protected for Credential {
    fn resource_id(&self) -> Uuid {
        self.id
    }

    fn organization_id(&self) -> Option<Uuid> {
        self.organization_id
    }

    fn access_entries(&self) -> &[AccessControlEntry] {
        &self.roles
    }
}
