#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static authorization oracle plugin
//!
//! Evaluates access against the role hierarchy carried by the request's
//! `SecurityContext` and the record's own access-control list.
//!
//! ## Mode: `role_hierarchy` (default)
//!
//! - superusers may read and write everything
//! - read: any direct or team grant on the record, or any role in the owning
//!   organization
//! - write: a direct or team `admin` grant, or `admin` in the owning
//!   organization
//!
//! ## Mode: `allow_all`
//!
//! Every decision is `true`. Intended for single-user installations.
//!
//! ## Configuration
//!
//! ```yaml
//! authz:
//!   mode: role_hierarchy
//! ```

pub mod config;
pub mod domain;

pub use config::{AuthZMode, StaticAuthZPluginConfig};
pub use domain::Service;
