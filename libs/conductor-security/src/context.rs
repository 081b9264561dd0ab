use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::acl::{Principal, Role};

/// A role the subject holds in an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMembership {
    pub organization_id: Uuid,
    pub role: Role,
}

/// `SecurityContext` encapsulates the security-related information for a request.
///
/// Built by the `AuthN` plugin during authentication and passed by parameter
/// through every pipeline stage. The authorization oracle reads it to decide
/// per-record access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityContext {
    /// The authenticated user making the request.
    subject_id: Uuid,
    /// Superusers bypass every access-control check.
    #[serde(default)]
    superuser: bool,
    /// Teams the subject is a member of.
    #[serde(default)]
    team_ids: Vec<Uuid>,
    /// Roles the subject holds in organizations.
    #[serde(default)]
    organizations: Vec<OrganizationMembership>,
    /// Original bearer token. Never serialized/persisted.
    #[serde(skip)]
    bearer_token: Option<SecretString>,
}

impl SecurityContext {
    /// Create a new `SecurityContext` builder
    #[must_use]
    pub fn builder() -> SecurityContextBuilder {
        SecurityContextBuilder::default()
    }

    /// Create an anonymous `SecurityContext` with no subject, teams or memberships
    #[must_use]
    pub fn anonymous() -> Self {
        SecurityContextBuilder::default().build()
    }

    #[must_use]
    pub fn subject_id(&self) -> Uuid {
        self.subject_id
    }

    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.superuser
    }

    #[must_use]
    pub fn team_ids(&self) -> &[Uuid] {
        &self.team_ids
    }

    #[must_use]
    pub fn organizations(&self) -> &[OrganizationMembership] {
        &self.organizations
    }

    #[must_use]
    pub fn bearer_token(&self) -> Option<&SecretString> {
        self.bearer_token.as_ref()
    }

    /// Whether a grant to `principal` applies to this subject.
    #[must_use]
    pub fn holds(&self, principal: Principal) -> bool {
        match principal {
            Principal::User(id) => id == self.subject_id,
            Principal::Team(id) => self.team_ids.contains(&id),
        }
    }

    /// Strongest role held in the given organization, `Admin` first.
    #[must_use]
    pub fn organization_role(&self, organization_id: Uuid) -> Option<Role> {
        let mut roles = self
            .organizations
            .iter()
            .filter(|m| m.organization_id == organization_id)
            .map(|m| m.role);
        let first = roles.next()?;
        if first == Role::Admin {
            return Some(first);
        }
        Some(roles.find(|r| *r == Role::Admin).unwrap_or(first))
    }
}

#[derive(Default)]
pub struct SecurityContextBuilder {
    subject_id: Option<Uuid>,
    superuser: bool,
    team_ids: Vec<Uuid>,
    organizations: Vec<OrganizationMembership>,
    bearer_token: Option<SecretString>,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn subject_id(mut self, subject_id: Uuid) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    #[must_use]
    pub fn superuser(mut self, superuser: bool) -> Self {
        self.superuser = superuser;
        self
    }

    #[must_use]
    pub fn team_ids(mut self, team_ids: Vec<Uuid>) -> Self {
        self.team_ids = team_ids;
        self
    }

    #[must_use]
    pub fn organization(mut self, organization_id: Uuid, role: Role) -> Self {
        self.organizations.push(OrganizationMembership {
            organization_id,
            role,
        });
        self
    }

    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<SecretString>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        SecurityContext {
            subject_id: self.subject_id.unwrap_or_default(),
            superuser: self.superuser,
            team_ids: self.team_ids,
            organizations: self.organizations,
            bearer_token: self.bearer_token,
        }
    }
}
