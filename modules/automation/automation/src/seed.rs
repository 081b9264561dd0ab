//! Start-up seeding of users and organizations from configuration.

use automation_sdk::models::{Organization, User};
use chrono::Utc;
use conductor_security::{AccessControlEntry, Role};
use uuid::Uuid;

use crate::config::SeedConfig;
use crate::domain::repo::Store;

/// Insert the configured records that do not exist yet. Safe to run on
/// every start.
///
/// # Errors
/// Returns the first storage failure.
pub async fn seed(store: &Store, cfg: &SeedConfig) -> anyhow::Result<()> {
    let now = Utc::now();
    let mut created = 0usize;

    for u in &cfg.users {
        if store.users.get(u.id).await?.is_some() {
            continue;
        }
        store
            .users
            .insert(User {
                id: u.id,
                username: u.username.clone(),
                first_name: u.first_name.clone(),
                last_name: u.last_name.clone(),
                email: u.email.clone(),
                created: now,
            })
            .await?;
        created += 1;
    }

    for o in &cfg.organizations {
        if store.organizations.get(o.id).await?.is_some() {
            continue;
        }
        let owner = o.admins.first().copied().unwrap_or(Uuid::nil());
        store
            .organizations
            .insert(Organization {
                id: o.id,
                name: o.name.clone(),
                description: o.description.clone(),
                created_by: owner,
                modified_by: owner,
                created: now,
                modified: now,
                roles: o
                    .admins
                    .iter()
                    .map(|id| AccessControlEntry::user(*id, Role::Admin))
                    .collect(),
            })
            .await?;
        created += 1;
    }

    tracing::info!(created, "seed data applied");
    Ok(())
}
