//! Stored record to hypermedia representation.
//!
//! `related` links are structural and always present. `summary_fields` are
//! filled from a bounded number of point lookups and count queries per
//! record; a lookup that fails or finds nothing omits its sub-block and is
//! logged at `warn`. Decoration itself never fails.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use automation_sdk::models::{Inventory, Job, Organization, Project, Representation, Team};
use conductor_security::{AccessControlEntry, Role};
use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use uuid::Uuid;

use super::fields::Fields;
use super::repo::{Collection, Document, Filter, StorageError, Store};

#[derive(Debug, Error)]
pub enum DecorationError {
    #[error("{relation} {id} does not exist")]
    Missing { relation: &'static str, id: Uuid },

    #[error("{relation} lookup failed: {source}")]
    Lookup {
        relation: &'static str,
        #[source]
        source: StorageError,
    },
}

/// Builds representations using point lookups against the store.
#[derive(Clone)]
pub struct Decorator {
    store: Store,
}

/// A resource that can be turned into a [`Representation`].
#[async_trait]
pub trait Decorate: Serialize + Send + Sync {
    async fn decorate(&self, decorator: &Decorator) -> Representation;
}

impl Decorator {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Decorate every record of a page, preserving order.
    pub async fn all<T: Decorate>(&self, records: &[T]) -> Vec<Representation> {
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            out.push(record.decorate(self).await);
        }
        out
    }

    async fn lookup<T: Document>(
        relation: &'static str,
        collection: &Arc<dyn Collection<T>>,
        id: Uuid,
    ) -> Result<T, DecorationError> {
        collection
            .get(id)
            .await
            .map_err(|source| DecorationError::Lookup { relation, source })?
            .ok_or(DecorationError::Missing { relation, id })
    }

    async fn user_summary(&self, relation: &'static str, id: Uuid) -> Option<Value> {
        let user = soften(Self::lookup(relation, &self.store.users, id).await)?;
        Some(json!({
            "id": user.id,
            "username": user.username,
            "first_name": user.first_name,
            "last_name": user.last_name,
        }))
    }

    async fn organization_summary(&self, id: Uuid) -> Option<Value> {
        let org = soften(Self::lookup("organization", &self.store.organizations, id).await)?;
        Some(json!({
            "id": org.id,
            "name": org.name,
            "description": org.description,
        }))
    }

    async fn project_summary(&self, id: Uuid) -> Option<Value> {
        let project = soften(Self::lookup("project", &self.store.projects, id).await)?;
        Some(json!({
            "id": project.id,
            "name": project.name,
            "description": project.description,
            "status": project.status,
            "scm_type": project.scm_type,
        }))
    }

    async fn count<T: Document>(
        relation: &'static str,
        collection: &Arc<dyn Collection<T>>,
        filter: &Filter,
    ) -> Option<usize> {
        soften(
            collection
                .count(filter)
                .await
                .map_err(|source| DecorationError::Lookup { relation, source }),
        )
    }

    /// Users granted `admin` directly; team grants are not expanded.
    async fn owners_summary(&self, roles: &[AccessControlEntry]) -> Value {
        let mut owners = Vec::new();
        let admins = roles
            .iter()
            .filter(|entry| entry.role == Role::Admin)
            .filter_map(|entry| entry.principal.user_id());
        for id in admins {
            if let Some(owner) = self.user_summary("owner", id).await {
                owners.push(owner);
            }
        }
        Value::Array(owners)
    }

    async fn audit_summary(
        &self,
        summary: &mut Map<String, Value>,
        created_by: Uuid,
        modified_by: Uuid,
    ) {
        insert(
            summary,
            "created_by",
            self.user_summary("created_by", created_by).await,
        );
        insert(
            summary,
            "modified_by",
            self.user_summary("modified_by", modified_by).await,
        );
    }
}

fn soften<T>(result: Result<T, DecorationError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(error = %e, "summary field omitted");
            None
        }
    }
}

fn insert(map: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(v) = value {
        map.insert(key.to_owned(), v);
    }
}

fn base<T: Serialize>(kind: &str, url: String, record: &T) -> Representation {
    let fields = match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            tracing::warn!(kind, "record did not serialize to an object");
            Map::new()
        }
    };
    Representation {
        kind: kind.to_owned(),
        url,
        related: BTreeMap::new(),
        summary_fields: Map::new(),
        fields,
    }
}

fn sub_links(related: &mut BTreeMap<String, String>, url: &str, names: &[&str]) {
    for name in names {
        related.insert((*name).to_owned(), format!("{url}{name}/"));
    }
}

fn user_url(id: Uuid) -> String {
    format!("/v1/users/{id}/")
}

fn object_roles(roles: &[(&str, &str)]) -> Value {
    Value::Array(
        roles
            .iter()
            .map(|(name, description)| json!({ "name": name, "description": description }))
            .collect(),
    )
}

#[async_trait]
impl Decorate for Organization {
    async fn decorate(&self, decorator: &Decorator) -> Representation {
        let url = format!("/v1/organizations/{}/", self.id);
        let mut repr = base("organization", url.clone(), self);

        repr.related.insert("created_by".to_owned(), user_url(self.created_by));
        repr.related.insert("modified_by".to_owned(), user_url(self.modified_by));
        sub_links(
            &mut repr.related,
            &url,
            &[
                "users",
                "teams",
                "projects",
                "inventories",
                "credentials",
                "admins",
                "activity_stream",
                "access_list",
                "object_roles",
            ],
        );

        let summary = &mut repr.summary_fields;
        decorator
            .audit_summary(summary, self.created_by, self.modified_by)
            .await;
        summary.insert(
            "object_roles".to_owned(),
            object_roles(&[
                ("admin", "Can manage all aspects of the organization"),
                ("member", "User is a member of the organization"),
                ("read", "May view settings for the organization"),
            ]),
        );
        summary.insert(
            "owners".to_owned(),
            decorator.owners_summary(&self.roles).await,
        );

        let in_org = Filter::new().equals(Fields::ORGANIZATION_ID, self.id);
        let store = &decorator.store;
        let projects = Decorator::count("projects", &store.projects, &in_org).await;
        let teams = Decorator::count("teams", &store.teams, &in_org).await;
        let inventories = Decorator::count("inventories", &store.inventories, &in_org).await;
        if let (Some(projects), Some(teams), Some(inventories)) = (projects, teams, inventories) {
            summary.insert(
                "related_field_counts".to_owned(),
                json!({ "projects": projects, "teams": teams, "inventories": inventories }),
            );
        }
        repr
    }
}

#[async_trait]
impl Decorate for Team {
    async fn decorate(&self, decorator: &Decorator) -> Representation {
        let url = format!("/v1/teams/{}/", self.id);
        let mut repr = base("team", url.clone(), self);

        repr.related.insert("created_by".to_owned(), user_url(self.created_by));
        repr.related.insert("modified_by".to_owned(), user_url(self.modified_by));
        repr.related.insert(
            "organization".to_owned(),
            format!("/v1/organizations/{}/", self.organization_id),
        );
        sub_links(
            &mut repr.related,
            &url,
            &[
                "users",
                "roles",
                "object_roles",
                "credentials",
                "projects",
                "activity_stream",
                "access_list",
            ],
        );

        let summary = &mut repr.summary_fields;
        insert(
            summary,
            "organization",
            decorator.organization_summary(self.organization_id).await,
        );
        decorator
            .audit_summary(summary, self.created_by, self.modified_by)
            .await;
        summary.insert(
            "object_roles".to_owned(),
            object_roles(&[
                ("admin", "Can manage all aspects of the team"),
                ("member", "User is a member of the team"),
                ("read", "May view this team"),
            ]),
        );
        repr
    }
}

#[async_trait]
impl Decorate for Project {
    async fn decorate(&self, decorator: &Decorator) -> Representation {
        let url = format!("/v1/projects/{}/", self.id);
        let mut repr = base("project", url.clone(), self);

        repr.related.insert("created_by".to_owned(), user_url(self.created_by));
        repr.related.insert("modified_by".to_owned(), user_url(self.modified_by));
        repr.related.insert(
            "organization".to_owned(),
            format!("/v1/organizations/{}/", self.organization_id),
        );
        if let Some(credential) = self.scm_credential_id {
            repr.related.insert(
                "scm_credential".to_owned(),
                format!("/v1/credentials/{credential}/"),
            );
        }
        sub_links(
            &mut repr.related,
            &url,
            &[
                "teams",
                "playbooks",
                "update",
                "project_updates",
                "activity_stream",
                "access_list",
                "object_roles",
                "schedules",
                "notification_templates_error",
                "notification_templates_success",
                "notification_templates_any",
            ],
        );

        let summary = &mut repr.summary_fields;
        insert(
            summary,
            "organization",
            decorator.organization_summary(self.organization_id).await,
        );
        decorator
            .audit_summary(summary, self.created_by, self.modified_by)
            .await;
        summary.insert(
            "object_roles".to_owned(),
            object_roles(&[
                ("admin", "Can manage all aspects of the project"),
                ("use", "Can use the project in a job template"),
                ("update", "May update project using the configured source control"),
                ("read", "May view settings for the project"),
            ]),
        );
        repr
    }
}

#[async_trait]
impl Decorate for Inventory {
    async fn decorate(&self, decorator: &Decorator) -> Representation {
        let url = format!("/v1/inventories/{}/", self.id);
        let mut repr = base("inventory", url.clone(), self);

        repr.related.insert("created_by".to_owned(), user_url(self.created_by));
        repr.related.insert("modified_by".to_owned(), user_url(self.modified_by));
        repr.related.insert(
            "organization".to_owned(),
            format!("/v1/organizations/{}/", self.organization_id),
        );
        sub_links(
            &mut repr.related,
            &url,
            &[
                "hosts",
                "groups",
                "root_groups",
                "variable_data",
                "script",
                "tree",
                "inventory_sources",
                "activity_stream",
                "job_templates",
                "ad_hoc_commands",
                "access_list",
                "object_roles",
            ],
        );

        let summary = &mut repr.summary_fields;
        insert(
            summary,
            "organization",
            decorator.organization_summary(self.organization_id).await,
        );
        decorator
            .audit_summary(summary, self.created_by, self.modified_by)
            .await;
        summary.insert(
            "object_roles".to_owned(),
            object_roles(&[
                ("admin", "Can manage all aspects of the inventory"),
                ("use", "Can use the inventory in a job template"),
                ("update", "May update inventory using the configured source"),
                ("read", "May view this inventory"),
            ]),
        );
        repr
    }
}

#[async_trait]
impl Decorate for Job {
    async fn decorate(&self, decorator: &Decorator) -> Representation {
        let url = format!("/v1/jobs/{}/", self.id);
        let mut repr = base("job", url.clone(), self);

        repr.related.insert("created_by".to_owned(), user_url(self.created_by));
        repr.related.insert(
            "project".to_owned(),
            format!("/v1/projects/{}/", self.project_id),
        );
        sub_links(&mut repr.related, &url, &["stdout", "cancel", "activity_stream"]);

        let summary = &mut repr.summary_fields;
        insert(
            summary,
            "project",
            decorator.project_summary(self.project_id).await,
        );
        insert(
            summary,
            "created_by",
            decorator.user_summary("created_by", self.created_by).await,
        );
        repr
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use automation_sdk::models::{ScmType, User};
    use chrono::Utc;
    use tracing_test::traced_test;

    use super::*;
    use crate::infra::storage::memory::MemoryStore;

    fn user(username: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_owned(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            email: format!("{username}@example.com"),
            created: Utc::now(),
        }
    }

    fn organization(owner: Uuid) -> Organization {
        let now = Utc::now();
        Organization {
            id: Uuid::new_v4(),
            name: "Default".to_owned(),
            description: "Main org".to_owned(),
            created_by: owner,
            modified_by: owner,
            created: now,
            modified: now,
            roles: Vec::new(),
        }
    }

    fn project(org: Uuid, owner: Uuid) -> Project {
        let now = Utc::now();
        Project {
            id: Uuid::new_v4(),
            name: "Site".to_owned(),
            description: String::new(),
            organization_id: org,
            scm_type: ScmType::Git,
            scm_url: String::new(),
            scm_branch: String::new(),
            scm_clean: false,
            scm_delete_on_update: false,
            scm_update_on_launch: false,
            scm_credential_id: Some(Uuid::new_v4()),
            local_path: String::new(),
            status: "new".to_owned(),
            created_by: owner,
            modified_by: owner,
            created: now,
            modified: now,
            roles: Vec::new(),
        }
    }

    #[tokio::test]
    async fn project_representation_has_links_and_summaries() {
        let mem = MemoryStore::new();
        let admin = user("admin");
        let org = organization(admin.id);
        mem.users.insert(admin.clone()).await.unwrap();
        mem.organizations.insert(org.clone()).await.unwrap();
        let p = project(org.id, admin.id);

        let repr = p.decorate(&Decorator::new(mem.store())).await;

        assert_eq!(repr.kind, "project");
        assert_eq!(repr.url, format!("/v1/projects/{}/", p.id));
        assert_eq!(
            repr.related["organization"],
            format!("/v1/organizations/{}/", org.id)
        );
        assert!(repr.related.contains_key("scm_credential"));
        assert_eq!(
            repr.related["playbooks"],
            format!("/v1/projects/{}/playbooks/", p.id)
        );
        assert_eq!(repr.summary_fields["organization"]["name"], "Default");
        assert_eq!(repr.summary_fields["created_by"]["username"], "admin");
        assert_eq!(repr.fields["name"], "Site");
        assert!(repr.fields.get("roles").is_none());
    }

    #[tokio::test]
    #[traced_test]
    async fn missing_relation_omits_sub_block_only() {
        let mem = MemoryStore::new();
        let p = project(Uuid::new_v4(), Uuid::new_v4());

        let repr = p.decorate(&Decorator::new(mem.store())).await;

        assert!(repr.summary_fields.get("organization").is_none());
        assert!(repr.summary_fields.get("created_by").is_none());
        assert!(repr.summary_fields.contains_key("object_roles"));
        assert!(repr.related.contains_key("organization"));
        assert!(logs_contain("summary field omitted"));
    }

    #[tokio::test]
    async fn organization_counts_related_resources() {
        let mem = MemoryStore::new();
        let admin = user("admin");
        let org = organization(admin.id);
        mem.users.insert(admin.clone()).await.unwrap();
        mem.organizations.insert(org.clone()).await.unwrap();
        mem.projects.insert(project(org.id, admin.id)).await.unwrap();

        let repr = org.decorate(&Decorator::new(mem.store())).await;

        assert_eq!(
            repr.summary_fields["related_field_counts"],
            json!({ "projects": 1, "teams": 0, "inventories": 0 })
        );
        assert_eq!(repr.summary_fields["object_roles"][0]["name"], "admin");
        assert_eq!(repr.summary_fields["owners"], json!([]));
    }

    #[tokio::test]
    #[traced_test]
    async fn organization_owners_are_direct_user_admins() {
        let mem = MemoryStore::new();
        let admin = user("admin");
        let reader = user("reader");
        let mut org = organization(admin.id);
        org.roles = vec![
            AccessControlEntry::user(admin.id, Role::Admin),
            AccessControlEntry::user(reader.id, Role::Read),
            AccessControlEntry::team(Uuid::new_v4(), Role::Admin),
            AccessControlEntry::user(Uuid::new_v4(), Role::Admin),
        ];
        mem.users.insert(admin.clone()).await.unwrap();
        mem.users.insert(reader).await.unwrap();

        let repr = org.decorate(&Decorator::new(mem.store())).await;

        let owners = repr.summary_fields["owners"].as_array().unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0]["id"], admin.id.to_string());
        assert_eq!(owners[0]["username"], "admin");
        assert!(logs_contain("owner"));
        assert!(logs_contain("summary field omitted"));
    }
}
