use automation_sdk::models::{Page, Representation, Team};
use automation_sdk::requests::NewTeam;
use chrono::Utc;
use conductor_security::{AccessControlEntry, Role, SecurityContext};
use uuid::Uuid;

use super::{ListRequest, Service, clean_name, unique_violation};
use crate::domain::decorate::Decorate;
use crate::domain::error::DomainError;
use crate::domain::filter;
use crate::domain::repo::Filter;

const TEAM: &str = "team";
const DUPLICATE_TEAM: &str = "Team with this Name and Organization already exists.";

impl Service {
    #[tracing::instrument(skip(self, ctx, req), fields(path = %req.path))]
    pub async fn list_teams(
        &self,
        ctx: &SecurityContext,
        req: &ListRequest,
    ) -> Result<Page<Representation>, DomainError> {
        self.list_resource(ctx, &filter::TEAMS, &self.store.teams, req, Filter::new())
            .await
    }

    #[tracing::instrument(skip(self, ctx), fields(team_id = %id))]
    pub async fn get_team(
        &self,
        ctx: &SecurityContext,
        id: Uuid,
    ) -> Result<Representation, DomainError> {
        let team = self.load_readable(ctx, &self.store.teams, id).await?;
        Ok(team.decorate(&self.decorator).await)
    }

    #[tracing::instrument(skip(self, ctx, req), fields(organization_id = %req.organization_id))]
    pub async fn create_team(
        &self,
        ctx: &SecurityContext,
        req: NewTeam,
    ) -> Result<Representation, DomainError> {
        let name = clean_name(&req.name)?;
        let organization = self.referenced_organization(req.organization_id).await?;
        self.ensure_write(ctx, &organization).await?;
        if Self::name_taken(&self.store.teams, &name, organization.id, None).await? {
            return Err(DomainError::validation(DUPLICATE_TEAM));
        }

        let now = Utc::now();
        let team = Team {
            id: Uuid::new_v4(),
            name,
            description: req.description.trim().to_owned(),
            organization_id: organization.id,
            created_by: ctx.subject_id(),
            modified_by: ctx.subject_id(),
            created: now,
            modified: now,
            roles: vec![AccessControlEntry::user(ctx.subject_id(), Role::Admin)],
        };
        self.store
            .teams
            .insert(team.clone())
            .await
            .map_err(|e| unique_violation(e, DUPLICATE_TEAM))?;
        tracing::info!(team_id = %team.id, "team created");

        self.activity
            .record(ctx, team.id, TEAM, format!("Team {} created", team.name))
            .await;
        Ok(team.decorate(&self.decorator).await)
    }
}
