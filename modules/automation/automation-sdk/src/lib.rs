#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Automation SDK
//!
//! Resource models, request payloads, the paginated envelope and the public
//! error type of the automation module. Consumers never depend on the
//! module crate directly for these types.

pub mod errors;
pub mod models;
pub mod requests;

pub use errors::AutomationError;
pub use models::{
    ActivityRecord, Credential, Inventory, Job, JobStatus, JobTemplate, JobType, Organization,
    Page, Project, Representation, ScmType, Team, User,
};
pub use requests::{NewInventory, NewOrganization, NewProject, NewTeam, ProjectPatch};
