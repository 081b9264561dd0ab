use automation_sdk::models::{Inventory, Page, Representation};
use automation_sdk::requests::NewInventory;
use chrono::Utc;
use conductor_security::{AccessControlEntry, Role, SecurityContext};
use uuid::Uuid;

use super::{ListRequest, Service, clean_name, unique_violation};
use crate::domain::decorate::Decorate;
use crate::domain::error::DomainError;
use crate::domain::filter;
use crate::domain::repo::Filter;

const INVENTORY: &str = "inventory";
const DUPLICATE_INVENTORY: &str = "Inventory with this Name and Organization already exists.";

impl Service {
    #[tracing::instrument(skip(self, ctx, req), fields(path = %req.path))]
    pub async fn list_inventories(
        &self,
        ctx: &SecurityContext,
        req: &ListRequest,
    ) -> Result<Page<Representation>, DomainError> {
        self.list_resource(
            ctx,
            &filter::INVENTORIES,
            &self.store.inventories,
            req,
            Filter::new(),
        )
        .await
    }

    #[tracing::instrument(skip(self, ctx), fields(inventory_id = %id))]
    pub async fn get_inventory(
        &self,
        ctx: &SecurityContext,
        id: Uuid,
    ) -> Result<Representation, DomainError> {
        let inventory = self.load_readable(ctx, &self.store.inventories, id).await?;
        Ok(inventory.decorate(&self.decorator).await)
    }

    /// Host and group counters start at zero; they are maintained elsewhere.
    #[tracing::instrument(skip(self, ctx, req), fields(organization_id = %req.organization_id))]
    pub async fn create_inventory(
        &self,
        ctx: &SecurityContext,
        req: NewInventory,
    ) -> Result<Representation, DomainError> {
        let name = clean_name(&req.name)?;
        let organization = self.referenced_organization(req.organization_id).await?;
        self.ensure_write(ctx, &organization).await?;
        if Self::name_taken(&self.store.inventories, &name, organization.id, None).await? {
            return Err(DomainError::validation(DUPLICATE_INVENTORY));
        }

        let now = Utc::now();
        let inventory = Inventory {
            id: Uuid::new_v4(),
            name,
            description: req.description.trim().to_owned(),
            organization_id: organization.id,
            variables: req.variables,
            total_hosts: 0,
            hosts_with_active_failures: 0,
            total_groups: 0,
            has_active_failures: false,
            created_by: ctx.subject_id(),
            modified_by: ctx.subject_id(),
            created: now,
            modified: now,
            roles: vec![AccessControlEntry::user(ctx.subject_id(), Role::Admin)],
        };
        self.store
            .inventories
            .insert(inventory.clone())
            .await
            .map_err(|e| unique_violation(e, DUPLICATE_INVENTORY))?;
        tracing::info!(inventory_id = %inventory.id, "inventory created");

        self.activity
            .record(
                ctx,
                inventory.id,
                INVENTORY,
                format!("Inventory {} created", inventory.name),
            )
            .await;
        Ok(inventory.decorate(&self.decorator).await)
    }
}
