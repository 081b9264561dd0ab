//! Role-hierarchy evaluation for the static authorization oracle.

use authz_oracle_sdk::Protected;
use conductor_security::{Role, SecurityContext};

use crate::config::{AuthZMode, StaticAuthZPluginConfig};

/// Static oracle service.
///
/// Decisions are pure functions of the `SecurityContext` and the record; no
/// lookups are performed.
#[derive(Debug, Clone, Default)]
pub struct Service {
    mode: AuthZMode,
}

impl Service {
    #[must_use]
    pub fn new(mode: AuthZMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub fn from_config(cfg: &StaticAuthZPluginConfig) -> Self {
        Self::new(cfg.mode)
    }

    /// Read decision.
    #[must_use]
    pub fn evaluate_read(&self, ctx: &SecurityContext, resource: &dyn Protected) -> bool {
        if self.bypass(ctx) {
            return true;
        }

        let granted = resource
            .access_entries()
            .iter()
            .any(|entry| ctx.holds(entry.principal));
        if granted {
            return true;
        }

        resource
            .organization_id()
            .and_then(|org| ctx.organization_role(org))
            .is_some()
    }

    /// Write decision.
    #[must_use]
    pub fn evaluate_write(&self, ctx: &SecurityContext, resource: &dyn Protected) -> bool {
        if self.bypass(ctx) {
            return true;
        }

        let granted = resource
            .access_entries()
            .iter()
            .any(|entry| entry.role == Role::Admin && ctx.holds(entry.principal));
        if granted {
            return true;
        }

        resource
            .organization_id()
            .and_then(|org| ctx.organization_role(org))
            == Some(Role::Admin)
    }

    fn bypass(&self, ctx: &SecurityContext) -> bool {
        self.mode == AuthZMode::AllowAll || ctx.is_superuser()
    }
}
