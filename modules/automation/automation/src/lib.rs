#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Automation module
//!
//! Organizations, teams, projects, inventories and jobs exposed as
//! access-controlled, paginated REST resources. Project mutations queue SCM
//! synchronization on a background runner without blocking the request.
//!
//! Layering: `api` (axum handlers) calls `domain` (services and the list
//! pipeline), which talks to storage and background work only through the
//! ports in `domain::repo` and `domain::dispatch`. `infra` implements them.

pub mod api;
pub mod config;
pub mod domain;
pub mod infra;
pub mod module;
pub mod seed;

pub use config::{AutomationConfig, SeedConfig};
pub use module::{AutomationModule, AutomationModuleBuilder};
