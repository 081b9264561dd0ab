//! `AuthorizationOracle` implementation for the static plugin.

use async_trait::async_trait;
use authz_oracle_sdk::{AuthZResolverError, AuthorizationOracle, Protected};
use conductor_security::SecurityContext;

use super::service::Service;

#[async_trait]
impl AuthorizationOracle for Service {
    async fn can_read(
        &self,
        ctx: &SecurityContext,
        resource: &dyn Protected,
    ) -> Result<bool, AuthZResolverError> {
        let allowed = self.evaluate_read(ctx, resource);
        tracing::trace!(
            subject = %ctx.subject_id(),
            resource = %resource.resource_id(),
            allowed,
            "read decision"
        );
        Ok(allowed)
    }

    async fn can_write(
        &self,
        ctx: &SecurityContext,
        resource: &dyn Protected,
    ) -> Result<bool, AuthZResolverError> {
        let allowed = self.evaluate_write(ctx, resource);
        tracing::trace!(
            subject = %ctx.subject_id(),
            resource = %resource.resource_id(),
            allowed,
            "write decision"
        );
        Ok(allowed)
    }
}
