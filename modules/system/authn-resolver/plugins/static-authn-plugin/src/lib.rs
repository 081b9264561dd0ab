#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static `AuthN` Plugin
//!
//! Maps bearer tokens to a `SecurityContext` from configuration. Token
//! issuance is handled elsewhere; this plugin only recognizes tokens.
//!
//! ## Modes
//!
//! - **`accept_all`** (default): Accepts any non-empty token, returns the configured
//!   default identity.
//!
//! - **`static_tokens`**: Maps specific tokens to specific identities. Useful for E2E tests
//!   with distinct users.
//!
//! ## Configuration
//!
//! ```yaml
//! authn:
//!   mode: static_tokens
//!   tokens:
//!     - token: "alice-token"
//!       identity:
//!         subject_id: "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa"
//!         organizations:
//!           - organization_id: "bbbbbbbb-bbbb-bbbb-bbbb-bbbbbbbbbbbb"
//!             role: admin
//! ```

pub mod config;
pub mod domain;

pub use config::{AuthNMode, IdentityConfig, StaticAuthNPluginConfig, TokenMapping};
pub use domain::Service;
