#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
pub mod acl;
pub mod context;

pub use acl::{AccessControlEntry, Principal, Role};
pub use context::{OrganizationMembership, SecurityContext};
