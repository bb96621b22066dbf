use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use tessera_core::{AppError, TenantId, UserId};
use thiserror::Error;
use uuid::Uuid;

use crate::{AuthObject, ResourcePermission};

/// Identifier of a guarded resource (api, service, mock service, sprint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Creates a random resource identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a resource identifier from an existing UUID value.
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

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ResourceId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a persisted grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GrantId(Uuid);

impl GrantId {
    /// Creates a random grant identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a grant identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a transport value into a grant identifier.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| AppError::Validation(format!("invalid grant id '{value}'")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for GrantId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for GrantId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Resource facts supplied by the owning resource family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMeta {
    /// Resource identifier.
    pub resource_id: ResourceId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// User that created the resource.
    pub created_by: UserId,
    /// `false` marks the resource as public.
    pub auth_control_enabled: bool,
}

/// Explicit permission grant of one auth object on one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant<P: ResourcePermission> {
    id: GrantId,
    resource_id: ResourceId,
    tenant_id: TenantId,
    auth_object: AuthObject,
    permissions: BTreeSet<P>,
    is_creator_grant: bool,
}

impl<P: ResourcePermission> Grant<P> {
    /// Creates a validated grant.
    pub fn new(
        id: GrantId,
        resource_id: ResourceId,
        tenant_id: TenantId,
        auth_object: AuthObject,
        permissions: BTreeSet<P>,
        is_creator_grant: bool,
    ) -> Result<Self, GrantError> {
        if !is_creator_grant && permissions.is_empty() {
            return Err(GrantError::EmptyPermissions);
        }

        Ok(Self {
            id,
            resource_id,
            tenant_id,
            auth_object,
            permissions,
            is_creator_grant,
        })
    }

    /// Creates the implicit all-permissions grant of a resource creator.
    #[must_use]
    pub fn creator(resource_id: ResourceId, tenant_id: TenantId, creator: UserId) -> Self {
        Self {
            id: GrantId::new(),
            resource_id,
            tenant_id,
            auth_object: AuthObject::user(creator),
            permissions: P::all().iter().copied().collect(),
            is_creator_grant: true,
        }
    }

    /// Returns the grant identifier.
    #[must_use]
    pub fn id(&self) -> GrantId {
        self.id
    }

    /// Returns the guarded resource.
    #[must_use]
    pub fn resource_id(&self) -> ResourceId {
        self.resource_id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the grantee.
    #[must_use]
    pub fn auth_object(&self) -> AuthObject {
        self.auth_object
    }

    /// Returns the declared permissions.
    ///
    /// A creator grant carries every permission regardless of this set; use
    /// [`Grant::allows`] for decisions.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<P> {
        &self.permissions
    }

    /// Returns whether this is the resource creator's grant.
    #[must_use]
    pub fn is_creator_grant(&self) -> bool {
        self.is_creator_grant
    }

    /// Returns whether this grant alone allows a permission.
    #[must_use]
    pub fn allows(&self, permission: P) -> bool {
        self.is_creator_grant || self.permissions.contains(&permission)
    }
}

/// Failures of grant mutation commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrantError {
    /// A grant for the same resource and grantee already exists.
    #[error("auth object '{auth_object_id}' already holds a grant on resource '{resource_id}'")]
    DuplicateGrant {
        /// Guarded resource.
        resource_id: String,
        /// Grantee.
        auth_object_id: String,
    },

    /// The referenced grant does not exist.
    #[error("grant '{grant_id}' was not found")]
    GrantNotFound {
        /// Requested grant.
        grant_id: String,
    },

    /// The creator grant can neither be modified nor revoked.
    #[error("grant '{grant_id}' is the creator grant and cannot be changed")]
    CreatorGrantImmutable {
        /// Requested grant.
        grant_id: String,
    },

    /// Non-creator grants must carry at least one permission.
    #[error("grant permissions must not be empty")]
    EmptyPermissions,
}

impl From<GrantError> for AppError {
    fn from(value: GrantError) -> Self {
        match value {
            GrantError::DuplicateGrant { .. } => Self::Conflict(value.to_string()),
            GrantError::GrantNotFound { .. } => Self::NotFound(value.to_string()),
            GrantError::CreatorGrantImmutable { .. } | GrantError::EmptyPermissions => {
                Self::Validation(value.to_string())
            }
        }
    }
}
