use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role granted to a principal on a resource or an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Can manage all aspects of the resource.
    Admin,
    /// Belongs to the resource (teams, organizations).
    Member,
    /// May view the resource.
    Read,
    /// May trigger updates (SCM sync) of the resource.
    Update,
    /// May use the resource in job templates.
    Use,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Read => "read",
            Self::Update => "update",
            Self::Use => "use",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The holder of a role: a single user or every member of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Principal {
    User(Uuid),
    Team(Uuid),
}

impl Principal {
    #[must_use]
    pub fn id(self) -> Uuid {
        match self {
            Self::User(id) | Self::Team(id) => id,
        }
    }

    #[must_use]
    pub fn user_id(self) -> Option<Uuid> {
        match self {
            Self::User(id) => Some(id),
            Self::Team(_) => None,
        }
    }

    #[must_use]
    pub fn team_id(self) -> Option<Uuid> {
        match self {
            Self::Team(id) => Some(id),
            Self::User(_) => None,
        }
    }
}

/// One grant in a resource's access-control list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlEntry {
    pub principal: Principal,
    pub role: Role,
}

impl AccessControlEntry {
    #[must_use]
    pub fn user(id: Uuid, role: Role) -> Self {
        Self {
            principal: Principal::User(id),
            role,
        }
    }

    #[must_use]
    pub fn team(id: Uuid, role: Role) -> Self {
        Self {
            principal: Principal::Team(id),
            role,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_with_tagged_principal() {
        let id = Uuid::nil();
        let json = serde_json::to_value(AccessControlEntry::team(id, Role::Read)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "principal": { "type": "team", "id": id },
                "role": "read",
            })
        );
    }

    #[test]
    fn principal_accessors() {
        let id = Uuid::new_v4();
        assert_eq!(Principal::User(id).id(), id);
        assert_eq!(Principal::User(id).team_id(), None);
        assert_eq!(Principal::Team(id).team_id(), Some(id));
        assert_eq!(Principal::User(id).user_id(), Some(id));
        assert_eq!(Principal::Team(id).user_id(), None);
    }
}
