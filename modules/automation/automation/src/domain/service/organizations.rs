use automation_sdk::models::{Organization, Page, Representation};
use automation_sdk::requests::NewOrganization;
use chrono::Utc;
use conductor_security::{AccessControlEntry, Role, SecurityContext};
use uuid::Uuid;

use super::{ListRequest, Service, clean_name};
use crate::domain::decorate::Decorate;
use crate::domain::error::DomainError;
use crate::domain::fields::Fields;
use crate::domain::filter;
use crate::domain::repo::Filter;

const ORGANIZATION: &str = "organization";

impl Service {
    #[tracing::instrument(skip(self, ctx, req), fields(path = %req.path))]
    pub async fn list_organizations(
        &self,
        ctx: &SecurityContext,
        req: &ListRequest,
    ) -> Result<Page<Representation>, DomainError> {
        self.list_resource(
            ctx,
            &filter::ORGANIZATIONS,
            &self.store.organizations,
            req,
            Filter::new(),
        )
        .await
    }

    #[tracing::instrument(skip(self, ctx), fields(organization_id = %id))]
    pub async fn get_organization(
        &self,
        ctx: &SecurityContext,
        id: Uuid,
    ) -> Result<Representation, DomainError> {
        let org = self
            .load_readable(ctx, &self.store.organizations, id)
            .await?;
        Ok(org.decorate(&self.decorator).await)
    }

    /// Only superusers create organizations; names are unique system-wide.
    #[tracing::instrument(skip(self, ctx, req))]
    pub async fn create_organization(
        &self,
        ctx: &SecurityContext,
        req: NewOrganization,
    ) -> Result<Representation, DomainError> {
        if !ctx.is_superuser() {
            return Err(DomainError::Forbidden);
        }
        let name = clean_name(&req.name)?;
        let same_name = Filter::new().equals(Fields::NAME, name.as_str());
        if self.store.organizations.count(&same_name).await? > 0 {
            return Err(DomainError::validation(
                "Organization with this Name already exists.",
            ));
        }

        let now = Utc::now();
        let org = Organization {
            id: Uuid::new_v4(),
            name,
            description: req.description.trim().to_owned(),
            created_by: ctx.subject_id(),
            modified_by: ctx.subject_id(),
            created: now,
            modified: now,
            roles: vec![AccessControlEntry::user(ctx.subject_id(), Role::Admin)],
        };
        self.store.organizations.insert(org.clone()).await?;
        tracing::info!(organization_id = %org.id, "organization created");

        self.activity
            .record(
                ctx,
                org.id,
                ORGANIZATION,
                format!("Organization {} created", org.name),
            )
            .await;
        Ok(org.decorate(&self.decorator).await)
    }
}
