#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authorization Oracle SDK
//!
//! This crate provides the contract consumed by resource modules to decide
//! access one record at a time:
//!
//! - [`AuthorizationOracle`] - `can_read` / `can_write` decisions
//! - [`Protected`] - what a record must expose to be judged
//! - [`AuthZResolverError`] - infrastructure failures of the oracle
//!
//! ## Usage
//!
//! ```ignore
//! use authz_oracle_sdk::AuthorizationOracle;
//!
//! if !oracle.can_read(&ctx, &project).await? {
//!     continue; // dropped silently from listings
//! }
//! ```
//!
//! Role semantics are owned by the implementation (see the static authz
//! plugin); consumers only rely on the boolean contract.

pub mod api;
pub mod error;
pub mod models;

pub use api::AuthorizationOracle;
pub use error::AuthZResolverError;
pub use models::Protected;
