use std::path::{Path, PathBuf};

use automation_sdk::models::{ActivityRecord, JobType, Page, Project, Representation, Team};
use automation_sdk::requests::{NewProject, ProjectPatch};
use chrono::Utc;
use conductor_security::{AccessControlEntry, Role, SecurityContext};
use uuid::Uuid;
use walkdir::WalkDir;

use super::{ListRequest, Service, clean_name, unique_violation};
use crate::domain::activity::ActivityRecorder;
use crate::domain::decorate::Decorate;
use crate::domain::error::DomainError;
use crate::domain::fields::Fields;
use crate::domain::filter;
use crate::domain::listing;
use crate::domain::repo::{Filter, ListQuery, drain};

/// Activity stream object type for projects.
pub const PROJECT: &str = "project";

const DUPLICATE_PROJECT: &str = "Project with this Name and Organization already exists.";
const MISSING_CREDENTIAL: &str = "SCM Credential does not exist.";
const STATUS_NEW: &str = "new";

impl Service {
    #[tracing::instrument(skip(self, ctx, req), fields(path = %req.path))]
    pub async fn list_projects(
        &self,
        ctx: &SecurityContext,
        req: &ListRequest,
    ) -> Result<Page<Representation>, DomainError> {
        self.list_resource(
            ctx,
            &filter::PROJECTS,
            &self.store.projects,
            req,
            Filter::new(),
        )
        .await
    }

    #[tracing::instrument(skip(self, ctx), fields(project_id = %id))]
    pub async fn get_project(
        &self,
        ctx: &SecurityContext,
        id: Uuid,
    ) -> Result<Representation, DomainError> {
        let project = self.load_readable(ctx, &self.store.projects, id).await?;
        Ok(project.decorate(&self.decorator).await)
    }

    #[tracing::instrument(skip(self, ctx, req), fields(organization_id = %req.organization_id))]
    pub async fn create_project(
        &self,
        ctx: &SecurityContext,
        req: NewProject,
    ) -> Result<Representation, DomainError> {
        let name = clean_name(&req.name)?;
        let organization = self.referenced_organization(req.organization_id).await?;
        self.ensure_write(ctx, &organization).await?;
        self.check_credential(req.scm_credential_id).await?;
        if Self::name_taken(&self.store.projects, &name, organization.id, None).await? {
            return Err(DomainError::validation(DUPLICATE_PROJECT));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let project = Project {
            id,
            name,
            description: req.description.trim().to_owned(),
            organization_id: organization.id,
            scm_type: req.scm_type,
            scm_url: req.scm_url,
            scm_branch: req.scm_branch,
            scm_clean: req.scm_clean,
            scm_delete_on_update: req.scm_delete_on_update,
            scm_update_on_launch: req.scm_update_on_launch,
            scm_credential_id: req.scm_credential_id,
            local_path: self.local_path(id),
            status: STATUS_NEW.to_owned(),
            created_by: ctx.subject_id(),
            modified_by: ctx.subject_id(),
            created: now,
            modified: now,
            roles: vec![AccessControlEntry::user(ctx.subject_id(), Role::Admin)],
        };
        self.store
            .projects
            .insert(project.clone())
            .await
            .map_err(|e| unique_violation(e, DUPLICATE_PROJECT))?;
        tracing::info!(project_id = %id, "project created");

        self.after_mutation(ctx, &project, "created").await;
        Ok(project.decorate(&self.decorator).await)
    }

    /// Full replacement of the mutable fields (PUT).
    #[tracing::instrument(skip(self, ctx, req), fields(project_id = %id))]
    pub async fn update_project(
        &self,
        ctx: &SecurityContext,
        id: Uuid,
        req: NewProject,
    ) -> Result<Representation, DomainError> {
        let existing = Self::load(&self.store.projects, id).await?;
        self.ensure_write(ctx, &existing).await?;

        let name = clean_name(&req.name)?;
        let organization = self.referenced_organization(req.organization_id).await?;
        if organization.id != existing.organization_id {
            self.ensure_write(ctx, &organization).await?;
        }
        self.check_credential(req.scm_credential_id).await?;
        if (name != existing.name || organization.id != existing.organization_id)
            && Self::name_taken(&self.store.projects, &name, organization.id, Some(id)).await?
        {
            return Err(DomainError::validation(DUPLICATE_PROJECT));
        }

        let project = Project {
            name,
            description: req.description.trim().to_owned(),
            organization_id: organization.id,
            scm_type: req.scm_type,
            scm_url: req.scm_url,
            scm_branch: req.scm_branch,
            scm_clean: req.scm_clean,
            scm_delete_on_update: req.scm_delete_on_update,
            scm_update_on_launch: req.scm_update_on_launch,
            scm_credential_id: req.scm_credential_id,
            modified_by: ctx.subject_id(),
            modified: Utc::now(),
            ..existing
        };
        self.store
            .projects
            .replace(project.clone())
            .await
            .map_err(|e| unique_violation(e, DUPLICATE_PROJECT))?;
        tracing::info!(project_id = %id, "project updated");

        self.after_mutation(ctx, &project, "updated").await;
        Ok(project.decorate(&self.decorator).await)
    }

    /// Partial update (PATCH). The response is re-read from storage.
    #[tracing::instrument(skip(self, ctx, patch), fields(project_id = %id))]
    pub async fn patch_project(
        &self,
        ctx: &SecurityContext,
        id: Uuid,
        patch: ProjectPatch,
    ) -> Result<Representation, DomainError> {
        let existing = Self::load(&self.store.projects, id).await?;
        self.ensure_write(ctx, &existing).await?;

        let mut project = existing.clone();
        if let Some(organization_id) = patch.organization_id {
            let organization = self.referenced_organization(organization_id).await?;
            if organization.id != existing.organization_id {
                self.ensure_write(ctx, &organization).await?;
            }
            project.organization_id = organization.id;
        }
        if let Some(name) = patch.name {
            project.name = clean_name(&name)?;
        }
        if patch.scm_credential_id.is_some() {
            self.check_credential(patch.scm_credential_id).await?;
            project.scm_credential_id = patch.scm_credential_id;
        }
        if (project.name != existing.name || project.organization_id != existing.organization_id)
            && Self::name_taken(
                &self.store.projects,
                &project.name,
                project.organization_id,
                Some(id),
            )
            .await?
        {
            return Err(DomainError::validation(DUPLICATE_PROJECT));
        }

        if let Some(description) = patch.description {
            project.description = description.trim().to_owned();
        }
        if let Some(v) = patch.scm_type {
            project.scm_type = v;
        }
        if let Some(v) = patch.scm_url {
            project.scm_url = v;
        }
        if let Some(v) = patch.scm_branch {
            project.scm_branch = v;
        }
        if let Some(v) = patch.scm_clean {
            project.scm_clean = v;
        }
        if let Some(v) = patch.scm_delete_on_update {
            project.scm_delete_on_update = v;
        }
        if let Some(v) = patch.scm_update_on_launch {
            project.scm_update_on_launch = v;
        }
        project.modified_by = ctx.subject_id();
        project.modified = Utc::now();

        self.store
            .projects
            .replace(project)
            .await
            .map_err(|e| unique_violation(e, DUPLICATE_PROJECT))?;
        let stored = Self::load(&self.store.projects, id).await?;
        tracing::info!(project_id = %id, "project patched");

        self.after_mutation(ctx, &stored, "updated").await;
        Ok(stored.decorate(&self.decorator).await)
    }

    /// Remove the project after its jobs and job templates. A failed cascade
    /// step leaves the project in place.
    #[tracing::instrument(skip(self, ctx), fields(project_id = %id))]
    pub async fn delete_project(&self, ctx: &SecurityContext, id: Uuid) -> Result<(), DomainError> {
        let project = Self::load(&self.store.projects, id).await?;
        self.ensure_write(ctx, &project).await?;

        let owned = Filter::new().equals(Fields::PROJECT_ID, id);
        let jobs = self.store.jobs.delete_many(&owned).await?;
        let templates = self.store.job_templates.delete_many(&owned).await?;
        if !self.store.projects.delete(id).await? {
            return Err(DomainError::not_found());
        }
        tracing::info!(project_id = %id, jobs, templates, "project deleted");

        self.cleanup.submit(PathBuf::from(&project.local_path));
        self.activity
            .record(ctx, id, PROJECT, format!("Project {} deleted", project.name))
            .await;
        Ok(())
    }

    /// Teams granted a role on the project.
    #[tracing::instrument(skip(self, ctx, req), fields(project_id = %id))]
    pub async fn project_teams(
        &self,
        ctx: &SecurityContext,
        id: Uuid,
        req: &ListRequest,
    ) -> Result<Page<Representation>, DomainError> {
        let project = self.load_readable(ctx, &self.store.projects, id).await?;

        let mut team_ids: Vec<Uuid> = Vec::new();
        for team_id in project.roles.iter().filter_map(|e| e.principal.team_id()) {
            if !team_ids.contains(&team_id) {
                team_ids.push(team_id);
            }
        }

        let mut teams: Vec<Team> = Vec::with_capacity(team_ids.len());
        for team_id in team_ids {
            match self.store.teams.get(team_id).await? {
                Some(team) => teams.push(team),
                None => tracing::warn!(%team_id, "project grants a role to a missing team"),
            }
        }

        let readable = listing::retain_readable(ctx, self.oracle.as_ref(), teams).await?;
        let page = self.paginate(readable, req)?;
        Ok(self.decorate_page(page).await)
    }

    #[tracing::instrument(skip(self, ctx, req), fields(project_id = %id))]
    pub async fn project_activity(
        &self,
        ctx: &SecurityContext,
        id: Uuid,
        req: &ListRequest,
    ) -> Result<Page<ActivityRecord>, DomainError> {
        self.load_readable(ctx, &self.store.projects, id).await?;
        let query = ListQuery::filtered(ActivityRecorder::for_object(id, PROJECT));
        let records = drain(self.store.activity.find(&query).await?).await?;
        self.paginate(records, req)
    }

    /// SCM update jobs of the project, filterable like the job list.
    #[tracing::instrument(skip(self, ctx, req), fields(project_id = %id))]
    pub async fn project_updates(
        &self,
        ctx: &SecurityContext,
        id: Uuid,
        req: &ListRequest,
    ) -> Result<Page<Representation>, DomainError> {
        self.load_readable(ctx, &self.store.projects, id).await?;
        let scope = Filter::new()
            .equals(Fields::JOB_TYPE, JobType::UpdateJob.as_str())
            .equals(Fields::PROJECT_ID, id);
        self.list_resource(ctx, &filter::JOBS, &self.store.jobs, req, scope)
            .await
    }

    /// Playbook files under the project's working directory, relative and sorted.
    #[tracing::instrument(skip(self, ctx), fields(project_id = %id))]
    pub async fn project_playbooks(
        &self,
        ctx: &SecurityContext,
        id: Uuid,
    ) -> Result<Vec<String>, DomainError> {
        let project = self.load_readable(ctx, &self.store.projects, id).await?;
        let root = PathBuf::from(project.local_path);
        tokio::task::spawn_blocking(move || find_playbooks(&root))
            .await
            .map_err(|e| DomainError::internal(format!("playbook scan failed: {e}")))
    }

    /// Whether the subject may request an SCM update of the project.
    #[tracing::instrument(skip(self, ctx), fields(project_id = %id))]
    pub async fn project_update_info(
        &self,
        ctx: &SecurityContext,
        id: Uuid,
    ) -> Result<bool, DomainError> {
        self.load_readable(ctx, &self.store.projects, id).await?;
        Ok(true)
    }

    /// Queue an SCM update now and report the job id.
    #[tracing::instrument(skip(self, ctx), fields(project_id = %id))]
    pub async fn trigger_project_update(
        &self,
        ctx: &SecurityContext,
        id: Uuid,
    ) -> Result<Uuid, DomainError> {
        let project = Self::load(&self.store.projects, id).await?;
        self.ensure_write(ctx, &project).await?;
        Ok(self.dispatcher.trigger(ctx, &project).await?)
    }

    fn local_path(&self, id: Uuid) -> String {
        self.config
            .projects_home
            .join(id.to_string())
            .display()
            .to_string()
    }

    async fn check_credential(&self, id: Option<Uuid>) -> Result<(), DomainError> {
        let Some(id) = id else {
            return Ok(());
        };
        match self.store.credentials.get(id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::validation(MISSING_CREDENTIAL)),
        }
    }

    async fn after_mutation(&self, ctx: &SecurityContext, project: &Project, verb: &str) {
        self.activity
            .record(
                ctx,
                project.id,
                PROJECT,
                format!("Project {} {verb}", project.name),
            )
            .await;
        self.dispatcher.dispatch(ctx, project).await;
    }
}

fn find_playbooks(root: &Path) -> Vec<String> {
    let mut found: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yml" || ext == "yaml")
        })
        .filter_map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .ok()
                .map(|rel| rel.to_string_lossy().into_owned())
        })
        .collect();
    found.sort();
    found
}
