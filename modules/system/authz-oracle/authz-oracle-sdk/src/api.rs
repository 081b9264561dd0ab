//! Public API trait for the authorization oracle.

use async_trait::async_trait;
use conductor_security::SecurityContext;

use crate::error::AuthZResolverError;
use crate::models::Protected;

/// Per-record authorization decisions.
///
/// ```ignore
/// let allowed = oracle.can_write(&ctx, &organization).await?;
/// ```
#[async_trait]
pub trait AuthorizationOracle: Send + Sync {
    /// Whether the subject may see `resource`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the decision could not be made. Refusal is
    /// `Ok(false)`, never an error.
    async fn can_read(
        &self,
        ctx: &SecurityContext,
        resource: &dyn Protected,
    ) -> Result<bool, AuthZResolverError>;

    /// Whether the subject may modify or delete `resource`.
    ///
    /// # Errors
    ///
    /// Returns an error only when the decision could not be made.
    async fn can_write(
        &self,
        ctx: &SecurityContext,
        resource: &dyn Protected,
    ) -> Result<bool, AuthZResolverError>;
}
