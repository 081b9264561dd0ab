//! Persisted field names and the [`Document`] view of every model.

use automation_sdk::models::{
    ActivityRecord, Credential, Inventory, Job, JobTemplate, Organization, Project, Team, User,
};
use uuid::Uuid;

use super::repo::{Document, FieldValue};

/// Persisted field names referenced outside the filter tables.
pub struct Fields;

impl Fields {
    pub const NAME: &'static str = "name";
    pub const ORGANIZATION_ID: &'static str = "organization_id";
    pub const PROJECT_ID: &'static str = "project_id";
    pub const JOB_TYPE: &'static str = "job_type";
    pub const OBJECT_ID: &'static str = "object_id";
    pub const OBJECT_TYPE: &'static str = "object_type";
}

impl Document for Organization {
    const COLLECTION: &'static str = "organizations";

    fn id(&self) -> Uuid {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => self.id.into(),
            "name" => self.name.as_str().into(),
            "description" => self.description.as_str().into(),
            "created_by" => self.created_by.into(),
            "modified_by" => self.modified_by.into(),
            "created" => self.created.into(),
            "modified" => self.modified.into(),
            _ => return None,
        })
    }
}

impl Document for Team {
    const COLLECTION: &'static str = "teams";

    fn id(&self) -> Uuid {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => self.id.into(),
            "name" => self.name.as_str().into(),
            "description" => self.description.as_str().into(),
            "organization_id" => self.organization_id.into(),
            "created_by" => self.created_by.into(),
            "modified_by" => self.modified_by.into(),
            "created" => self.created.into(),
            "modified" => self.modified.into(),
            _ => return None,
        })
    }

    fn unique_key(&self) -> Option<(String, Uuid)> {
        Some((self.name.clone(), self.organization_id))
    }
}

impl Document for Project {
    const COLLECTION: &'static str = "projects";

    fn id(&self) -> Uuid {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => self.id.into(),
            "name" => self.name.as_str().into(),
            "description" => self.description.as_str().into(),
            "organization_id" => self.organization_id.into(),
            "scm_type" => self.scm_type.as_str().into(),
            "scm_url" => self.scm_url.as_str().into(),
            "scm_branch" => self.scm_branch.as_str().into(),
            "scm_clean" => self.scm_clean.into(),
            "scm_delete_on_update" => self.scm_delete_on_update.into(),
            "scm_update_on_launch" => self.scm_update_on_launch.into(),
            "scm_credential_id" => self.scm_credential_id.into(),
            "local_path" => self.local_path.as_str().into(),
            "status" => self.status.as_str().into(),
            "created_by" => self.created_by.into(),
            "modified_by" => self.modified_by.into(),
            "created" => self.created.into(),
            "modified" => self.modified.into(),
            _ => return None,
        })
    }

    fn unique_key(&self) -> Option<(String, Uuid)> {
        Some((self.name.clone(), self.organization_id))
    }
}

impl Document for Inventory {
    const COLLECTION: &'static str = "inventories";

    fn id(&self) -> Uuid {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => self.id.into(),
            "name" => self.name.as_str().into(),
            "description" => self.description.as_str().into(),
            "organization_id" => self.organization_id.into(),
            "variables" => self.variables.as_str().into(),
            "total_hosts" => self.total_hosts.into(),
            "hosts_with_active_failures" => self.hosts_with_active_failures.into(),
            "total_groups" => self.total_groups.into(),
            "has_active_failures" => self.has_active_failures.into(),
            "created_by" => self.created_by.into(),
            "modified_by" => self.modified_by.into(),
            "created" => self.created.into(),
            "modified" => self.modified.into(),
            _ => return None,
        })
    }

    fn unique_key(&self) -> Option<(String, Uuid)> {
        Some((self.name.clone(), self.organization_id))
    }
}

impl Document for JobTemplate {
    const COLLECTION: &'static str = "job_templates";

    fn id(&self) -> Uuid {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => self.id.into(),
            "name" => self.name.as_str().into(),
            "project_id" => self.project_id.into(),
            "inventory_id" => self.inventory_id.into(),
            "playbook" => self.playbook.as_str().into(),
            "organization_id" => self.organization_id.into(),
            "created" => self.created.into(),
            "modified" => self.modified.into(),
            _ => return None,
        })
    }
}

impl Document for Credential {
    const COLLECTION: &'static str = "credentials";

    fn id(&self) -> Uuid {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => self.id.into(),
            "name" => self.name.as_str().into(),
            "kind" => self.kind.as_str().into(),
            "organization_id" => self.organization_id.into(),
            "created" => self.created.into(),
            _ => return None,
        })
    }
}

impl Document for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> Uuid {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => self.id.into(),
            "username" => self.username.as_str().into(),
            "email" => self.email.as_str().into(),
            "created" => self.created.into(),
            _ => return None,
        })
    }
}

impl Document for Job {
    const COLLECTION: &'static str = "jobs";

    fn id(&self) -> Uuid {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => self.id.into(),
            "name" => self.name.as_str().into(),
            "job_type" => self.job_type.as_str().into(),
            "status" => self.status.as_str().into(),
            "failed" => self.failed.into(),
            "project_id" => self.project_id.into(),
            "organization_id" => self.organization_id.into(),
            "created_by" => self.created_by.into(),
            "created" => self.created.into(),
            "modified" => self.modified.into(),
            "started" => self.started.into(),
            "finished" => self.finished.into(),
            _ => return None,
        })
    }
}

impl Document for ActivityRecord {
    const COLLECTION: &'static str = "activity_stream";

    fn id(&self) -> Uuid {
        self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => self.id.into(),
            "actor_id" => self.actor_id.into(),
            "object_id" => self.object_id.into(),
            "object_type" => self.object_type.as_str().into(),
            "created" => self.created.into(),
            _ => return None,
        })
    }
}
