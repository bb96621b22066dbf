use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;

use tessera_core::{AppError, AppResult, TenantId, UserId};
use tessera_domain::{
    AuthObject, AuthObjectId, Grant, GrantId, ResourceId, ResourceKind, ResourceMeta,
    ResourcePermission,
};

/// Persisted grant row shared by every resource family.
///
/// Permissions are kept as storage values; the owning family decodes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRecord {
    /// Stable grant identifier.
    pub grant_id: GrantId,
    /// Family of the guarded resource.
    pub resource_kind: ResourceKind,
    /// Guarded resource.
    pub resource_id: ResourceId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Grantee.
    pub auth_object: AuthObject,
    /// Permission storage values.
    pub permissions: Vec<String>,
    /// Marks the implicit grant of the resource creator.
    pub is_creator_grant: bool,
    /// Grant timestamp in RFC3339.
    pub granted_at: String,
}

impl GrantRecord {
    /// Decodes the row into a typed grant of one family.
    pub fn decode<P: ResourcePermission>(&self) -> AppResult<Grant<P>> {
        let permissions = self
            .permissions
            .iter()
            .map(|value| {
                P::from_str(value.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode permission '{value}' of grant '{}': {error}",
                        self.grant_id
                    ))
                })
            })
            .collect::<AppResult<BTreeSet<P>>>()?;

        Grant::new(
            self.grant_id,
            self.resource_id,
            self.tenant_id,
            self.auth_object,
            permissions,
            self.is_creator_grant,
        )
        .map_err(|error| {
            AppError::Internal(format!(
                "stored grant '{}' violates grant invariants: {error}",
                self.grant_id
            ))
        })
    }
}

/// Decodes a batch of rows into typed grants.
pub fn decode_grants<P: ResourcePermission>(records: &[GrantRecord]) -> AppResult<Vec<Grant<P>>> {
    records.iter().map(GrantRecord::decode::<P>).collect()
}

/// Encodes typed permissions into storage values.
#[must_use]
pub fn encode_permissions<P: ResourcePermission>(permissions: &BTreeSet<P>) -> Vec<String> {
    permissions
        .iter()
        .map(|permission| permission.as_str().to_owned())
        .collect()
}

/// Input payload for persisting a new grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGrantInput {
    /// Family of the guarded resource.
    pub resource_kind: ResourceKind,
    /// Guarded resource.
    pub resource_id: ResourceId,
    /// Grantee.
    pub auth_object: AuthObject,
    /// Permission storage values.
    pub permissions: Vec<String>,
    /// Marks the implicit grant of the resource creator.
    pub is_creator_grant: bool,
}

/// Repository port for grant storage.
///
/// Implementations must reject a second grant for the same
/// `(resource, auth object id, auth object type)` and a second creator grant
/// per resource with [`tessera_domain::GrantError::DuplicateGrant`].
#[async_trait]
pub trait GrantRepository: Send + Sync {
    /// Finds grants on any of the resources held by any of the auth objects.
    async fn find_grants_for_identities(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_ids: &[ResourceId],
        auth_object_ids: &[AuthObjectId],
    ) -> AppResult<Vec<GrantRecord>>;

    /// Lists every grant of a family held by any of the auth objects.
    async fn list_grants_for_identities(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        auth_object_ids: &[AuthObjectId],
    ) -> AppResult<Vec<GrantRecord>>;

    /// Lists every grant on one resource.
    async fn list_grants_for_resource(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_id: ResourceId,
    ) -> AppResult<Vec<GrantRecord>>;

    /// Finds one grant by id.
    async fn find_grant(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        grant_id: GrantId,
    ) -> AppResult<Option<GrantRecord>>;

    /// Persists a new grant.
    async fn create_grant(
        &self,
        tenant_id: TenantId,
        input: CreateGrantInput,
    ) -> AppResult<GrantRecord>;

    /// Replaces the permission set of an existing grant.
    async fn replace_grant_permissions(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        grant_id: GrantId,
        permissions: Vec<String>,
    ) -> AppResult<GrantRecord>;

    /// Deletes one grant.
    async fn delete_grant(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        grant_id: GrantId,
    ) -> AppResult<()>;

    /// Deletes every grant on a resource and returns the removed count.
    async fn delete_grants_for_resource(
        &self,
        tenant_id: TenantId,
        resource_kind: ResourceKind,
        resource_id: ResourceId,
    ) -> AppResult<u64>;
}

/// Port through which a resource family exposes the facts the engine needs.
#[async_trait]
pub trait ResourceMetadataProvider: Send + Sync {
    /// Finds metadata of one resource.
    async fn find_resource_meta(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
    ) -> AppResult<Option<ResourceMeta>>;

    /// Lists metadata of many resources; unknown ids are omitted.
    async fn list_resource_meta(
        &self,
        tenant_id: TenantId,
        resource_ids: &[ResourceId],
    ) -> AppResult<Vec<ResourceMeta>>;

    /// Finds the human-readable name of a resource, for denial messages.
    async fn find_resource_name(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
    ) -> AppResult<Option<String>>;
}

/// Port answering whether a user administers a tenant.
#[async_trait]
pub trait TenantAdminDirectory: Send + Sync {
    /// Returns whether the user is a tenant administrator.
    async fn is_tenant_admin(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool>;
}

/// Port listing organizational unit memberships.
#[async_trait]
pub trait OrgMembershipRepository: Send + Sync {
    /// Lists departments and groups the user is a direct member of.
    async fn list_org_units_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<AuthObject>>;
}
