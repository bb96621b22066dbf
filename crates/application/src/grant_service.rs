use std::collections::BTreeSet;

use tracing::info;

use tessera_core::{AppError, AppResult, CallerContext, TenantId};
use tessera_domain::{
    AuthObject, Grant, GrantError, GrantId, ResourceFamily, ResourceId, ResourcePermission,
};

use crate::{CreateGrantInput, GrantRecord, ResourceAuthorizationService, encode_permissions};


/// Grant on a resource together with its persisted grant time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantListing<P: ResourcePermission> {
    /// Decoded grant.
    pub grant: Grant<P>,
    /// Grant timestamp in RFC3339.
    pub granted_at: String,
}

/// Application service for the grant commands of one resource family.
///
/// These commands are the only writers of grant state; the authorization
/// engine only reads it.
pub struct GrantService<F: ResourceFamily> {
    authorization: ResourceAuthorizationService<F>,
}

impl<F: ResourceFamily> Clone for GrantService<F> {
    fn clone(&self) -> Self {
        Self {
            authorization: self.authorization.clone(),
        }
    }
}

impl<F: ResourceFamily> GrantService<F> {
    /// Creates the service on top of the family's authorization engine.
    #[must_use]
    pub fn new(authorization: ResourceAuthorizationService<F>) -> Self {
        Self { authorization }
    }

    /// Creates the creator grant of a freshly created resource.
    ///
    /// Called by the resource command layer in the transaction that created
    /// the resource; the caller must be the recorded creator.
    pub async fn provision_creator_grant(
        &self,
        caller: &CallerContext,
        resource_id: ResourceId,
    ) -> AppResult<Grant<F::Permission>> {
        let meta = self
            .authorization
            .require_resource_meta(caller, resource_id)
            .await?;
        if meta.created_by != caller.user_id() {
            return Err(AppError::Forbidden(format!(
                "user '{}' did not create {} resource '{resource_id}'",
                caller.user_id(),
                F::KIND.as_str()
            )));
        }

        let existing = self
            .authorization
            .grant_repository()
            .list_grants_for_resource(caller.tenant_id(), F::KIND, resource_id)
            .await?;
        if existing.iter().any(|record| record.is_creator_grant) {
            return Err(GrantError::DuplicateGrant {
                resource_id: resource_id.to_string(),
                auth_object_id: caller.user_id().to_string(),
            }
            .into());
        }

        let all_permissions: BTreeSet<F::Permission> =
            F::Permission::all().iter().copied().collect();
        let record = self
            .authorization
            .grant_repository()
            .create_grant(
                caller.tenant_id(),
                CreateGrantInput {
                    resource_kind: F::KIND,
                    resource_id,
                    auth_object: AuthObject::user(caller.user_id()),
                    permissions: encode_permissions(&all_permissions),
                    is_creator_grant: true,
                },
            )
            .await?;

        info!(
            tenant_id = %caller.tenant_id(),
            resource_kind = F::KIND.as_str(),
            %resource_id,
            grant_id = %record.grant_id,
            "provisioned creator grant"
        );

        record.decode()
    }

    /// Grants permissions on a resource to a user or org unit.
    pub async fn create_grant(
        &self,
        caller: &CallerContext,
        resource_id: ResourceId,
        auth_object: AuthObject,
        permissions: BTreeSet<F::Permission>,
    ) -> AppResult<Grant<F::Permission>> {
        self.authorization
            .require(caller, resource_id, F::Permission::GRANT)
            .await?;
        if permissions.is_empty() {
            return Err(GrantError::EmptyPermissions.into());
        }

        let record = self
            .authorization
            .grant_repository()
            .create_grant(
                caller.tenant_id(),
                CreateGrantInput {
                    resource_kind: F::KIND,
                    resource_id,
                    auth_object,
                    permissions: encode_permissions(&permissions),
                    is_creator_grant: false,
                },
            )
            .await?;

        info!(
            tenant_id = %caller.tenant_id(),
            actor = %caller.user_id(),
            resource_kind = F::KIND.as_str(),
            %resource_id,
            grant_id = %record.grant_id,
            auth_object_id = %auth_object.id,
            auth_object_type = auth_object.object_type.as_str(),
            "created grant"
        );

        record.decode()
    }

    /// Replaces the permission set of an existing non-creator grant.
    pub async fn replace_grant_permissions(
        &self,
        caller: &CallerContext,
        grant_id: GrantId,
        permissions: BTreeSet<F::Permission>,
    ) -> AppResult<Grant<F::Permission>> {
        let existing = self.require_mutable_grant(caller, grant_id).await?;
        if permissions.is_empty() {
            return Err(GrantError::EmptyPermissions.into());
        }

        let record = self
            .authorization
            .grant_repository()
            .replace_grant_permissions(
                caller.tenant_id(),
                F::KIND,
                grant_id,
                encode_permissions(&permissions),
            )
            .await?;

        info!(
            tenant_id = %caller.tenant_id(),
            actor = %caller.user_id(),
            resource_kind = F::KIND.as_str(),
            resource_id = %existing.resource_id,
            %grant_id,
            "replaced grant permissions"
        );

        record.decode()
    }

    /// Revokes a non-creator grant.
    pub async fn revoke_grant(&self, caller: &CallerContext, grant_id: GrantId) -> AppResult<()> {
        let existing = self.require_mutable_grant(caller, grant_id).await?;

        self.authorization
            .grant_repository()
            .delete_grant(caller.tenant_id(), F::KIND, grant_id)
            .await?;

        info!(
            tenant_id = %caller.tenant_id(),
            actor = %caller.user_id(),
            resource_kind = F::KIND.as_str(),
            resource_id = %existing.resource_id,
            %grant_id,
            "revoked grant"
        );

        Ok(())
    }

    /// Lists the grants on a resource for callers allowed to view it.
    pub async fn list_grants(
        &self,
        caller: &CallerContext,
        resource_id: ResourceId,
    ) -> AppResult<Vec<GrantListing<F::Permission>>> {
        self.authorization
            .require(caller, resource_id, F::Permission::VIEW)
            .await?;

        self.authorization
            .grant_repository()
            .list_grants_for_resource(caller.tenant_id(), F::KIND, resource_id)
            .await?
            .into_iter()
            .map(|record| {
                Ok(GrantListing {
                    grant: record.decode()?,
                    granted_at: record.granted_at,
                })
            })
            .collect()
    }

    /// Removes every grant of a deleted resource.
    ///
    /// Runs inside the resource deletion, which already authorized the caller.
    pub async fn delete_resource_grants(
        &self,
        tenant_id: TenantId,
        resource_id: ResourceId,
    ) -> AppResult<u64> {
        let removed = self
            .authorization
            .grant_repository()
            .delete_grants_for_resource(tenant_id, F::KIND, resource_id)
            .await?;

        info!(
            %tenant_id,
            resource_kind = F::KIND.as_str(),
            %resource_id,
            removed,
            "deleted resource grants"
        );

        Ok(removed)
    }

    async fn require_mutable_grant(
        &self,
        caller: &CallerContext,
        grant_id: GrantId,
    ) -> AppResult<GrantRecord> {
        let existing = self
            .authorization
            .grant_repository()
            .find_grant(caller.tenant_id(), F::KIND, grant_id)
            .await?
            .ok_or_else(|| GrantError::GrantNotFound {
                grant_id: grant_id.to_string(),
            })?;

        self.authorization
            .require(caller, existing.resource_id, F::Permission::GRANT)
            .await?;

        if existing.is_creator_grant {
            return Err(GrantError::CreatorGrantImmutable {
                grant_id: grant_id.to_string(),
            }
            .into());
        }

        Ok(existing)
    }
}
