//! Service implementation for the static `AuthN` plugin.

use std::collections::HashMap;

use conductor_security::SecurityContext;

use crate::config::{AuthNMode, IdentityConfig, StaticAuthNPluginConfig};

/// Static `AuthN` service.
///
/// Provides token-to-identity mapping based on configuration mode:
/// - `accept_all`: Any non-empty token maps to the default identity
/// - `static_tokens`: Specific tokens map to specific identities
#[derive(Debug, Clone)]
pub struct Service {
    mode: AuthNMode,
    default_identity: IdentityConfig,
    token_map: HashMap<String, IdentityConfig>,
}

impl Service {
    /// Create a service from plugin configuration.
    #[must_use]
    pub fn from_config(cfg: &StaticAuthNPluginConfig) -> Self {
        let token_map: HashMap<String, IdentityConfig> = cfg
            .tokens
            .iter()
            .map(|m| (m.token.clone(), m.identity.clone()))
            .collect();

        Self {
            mode: cfg.mode,
            default_identity: cfg.default_identity.clone(),
            token_map,
        }
    }

    /// Authenticate a bearer token and return the request's security context.
    ///
    /// Returns `None` if the token is not recognized (in `static_tokens` mode)
    /// or empty.
    #[must_use]
    pub fn authenticate(&self, bearer_token: &str) -> Option<SecurityContext> {
        if bearer_token.is_empty() {
            return None;
        }

        let identity = match self.mode {
            AuthNMode::AcceptAll => &self.default_identity,
            AuthNMode::StaticTokens => self.token_map.get(bearer_token)?,
        };

        Some(build_context(identity, bearer_token))
    }
}

fn build_context(identity: &IdentityConfig, bearer_token: &str) -> SecurityContext {
    let mut builder = SecurityContext::builder()
        .subject_id(identity.subject_id)
        .superuser(identity.superuser)
        .team_ids(identity.team_ids.clone())
        .bearer_token(bearer_token.to_owned());
    for membership in &identity.organizations {
        builder = builder.organization(membership.organization_id, membership.role);
    }
    builder.build()
}
