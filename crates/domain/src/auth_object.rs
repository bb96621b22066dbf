use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tessera_core::{AppError, UserId};
use uuid::Uuid;

/// Identifier of anything a grant can target: a user or an organizational unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuthObjectId(Uuid);

impl AuthObjectId {
    /// Creates a random auth object identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an auth object identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AuthObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<UserId> for AuthObjectId {
    fn from(value: UserId) -> Self {
        Self(value.as_uuid())
    }
}

impl Display for AuthObjectId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Kind of grantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthObjectType {
    /// Individual user.
    User,
    /// Department.
    Dept,
    /// User group.
    Group,
}

impl AuthObjectType {
    /// Returns a stable storage value for this type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Dept => "dept",
            Self::Group => "group",
        }
    }

    /// Returns whether this type is an organizational unit.
    #[must_use]
    pub fn is_org_unit(&self) -> bool {
        !matches!(self, Self::User)
    }
}

impl FromStr for AuthObjectType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "dept" => Ok(Self::Dept),
            "group" => Ok(Self::Group),
            _ => Err(AppError::Validation(format!(
                "unknown auth object type '{value}'"
            ))),
        }
    }
}

/// A typed grantee reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AuthObject {
    /// Grantee identifier.
    pub id: AuthObjectId,
    /// Grantee kind.
    pub object_type: AuthObjectType,
}

impl AuthObject {
    /// Creates a user grantee.
    #[must_use]
    pub fn user(user_id: UserId) -> Self {
        Self {
            id: user_id.into(),
            object_type: AuthObjectType::User,
        }
    }

    /// Creates an organizational unit grantee.
    pub fn org_unit(id: AuthObjectId, object_type: AuthObjectType) -> Result<Self, AppError> {
        if !object_type.is_org_unit() {
            return Err(AppError::Validation(format!(
                "auth object type '{}' is not an organizational unit",
                object_type.as_str()
            )));
        }

        Ok(Self { id, object_type })
    }
}

/// Request-scoped set of identities a user acts as: the user and every
/// organizational unit the user is a direct member of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySet {
    user_id: UserId,
    members: BTreeSet<AuthObject>,
}

impl IdentitySet {
    /// Creates the identity set of a user without any org-unit membership.
    #[must_use]
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id,
            members: BTreeSet::from([AuthObject::user(user_id)]),
        }
    }

    /// Adds organizational units to the set. Non-org-unit entries are ignored.
    #[must_use]
    pub fn with_org_units(mut self, org_units: impl IntoIterator<Item = AuthObject>) -> Self {
        self.members.extend(
            org_units
                .into_iter()
                .filter(|member| member.object_type.is_org_unit()),
        );
        self
    }

    /// Returns the user the set was expanded for.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns every identity in the set.
    #[must_use]
    pub fn members(&self) -> &BTreeSet<AuthObject> {
        &self.members
    }

    /// Returns the ids used as grant lookup keys.
    #[must_use]
    pub fn auth_object_ids(&self) -> Vec<AuthObjectId> {
        let ids: BTreeSet<AuthObjectId> = self.members.iter().map(|member| member.id).collect();
        ids.into_iter().collect()
    }

    /// Returns whether a grantee id belongs to the set.
    #[must_use]
    pub fn contains(&self, id: AuthObjectId) -> bool {
        self.members.iter().any(|member| member.id == id)
    }
}

#[cfg(test)]
mod tests {
    use tessera_core::UserId;

    use super::{AuthObject, AuthObjectId, AuthObjectType, IdentitySet};

    #[test]
    fn identity_set_always_contains_user() {
        let user_id = UserId::new();
        let identities = IdentitySet::for_user(user_id);

        assert!(identities.contains(user_id.into()));
        assert_eq!(identities.auth_object_ids().len(), 1);
    }

    #[test]
    fn identity_set_ignores_user_entries_passed_as_org_units() {
        let user_id = UserId::new();
        let department = AuthObject::org_unit(AuthObjectId::new(), AuthObjectType::Dept);
        assert!(department.is_ok());
        let department = department.unwrap_or_else(|_| unreachable!());

        let identities = IdentitySet::for_user(user_id)
            .with_org_units([department, AuthObject::user(UserId::new())]);

        assert_eq!(identities.members().len(), 2);
        assert!(identities.contains(department.id));
    }

    #[test]
    fn org_unit_rejects_user_type() {
        let result = AuthObject::org_unit(AuthObjectId::new(), AuthObjectType::User);
        assert!(result.is_err());
    }
}
