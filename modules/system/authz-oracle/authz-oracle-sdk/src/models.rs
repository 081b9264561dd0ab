//! Models the oracle reasons about.

use conductor_security::AccessControlEntry;
use uuid::Uuid;

/// A record that carries its own access-control list.
///
/// Organizations report themselves as their owning organization so that
/// organization roles apply uniformly.
pub trait Protected: Send + Sync {
    /// Identifier of the record being judged.
    fn resource_id(&self) -> Uuid;

    /// Organization whose roles also grant access, if any.
    fn organization_id(&self) -> Option<Uuid>;

    /// Grants attached directly to the record.
    fn access_entries(&self) -> &[AccessControlEntry];
}
