use std::collections::BTreeSet;

use tracing::debug;

use tessera_domain::effective_permissions;

use super::*;

impl<F: ResourceFamily> ResourceAuthorizationService<F> {
    /// Returns every resource of the family the caller holds `permission` on
    /// through a grant to the caller or one of the caller's org units.
    ///
    /// Public resources are not listed; callers merge them from their own
    /// catalog query.
    pub async fn list_accessible(
        &self,
        caller: &CallerContext,
        permission: F::Permission,
    ) -> AppResult<BTreeSet<ResourceId>> {
        let identities = self.expander.expand(caller).await?;
        let records = self
            .grant_repository
            .list_grants_for_identities(
                caller.tenant_id(),
                F::KIND,
                identities.auth_object_ids().as_slice(),
            )
            .await?;

        let accessible: BTreeSet<ResourceId> = decode_grants::<F::Permission>(&records)?
            .into_iter()
            .filter(|grant| grant.allows(permission))
            .map(|grant| grant.resource_id())
            .collect();

        debug!(
            user_id = %caller.user_id(),
            resource_kind = F::KIND.as_str(),
            permission = permission.as_str(),
            accessible = accessible.len(),
            "listed accessible resources"
        );

        Ok(accessible)
    }

    /// Returns the permissions the caller can exercise on a resource.
    pub async fn list_effective_permissions(
        &self,
        caller: &CallerContext,
        resource_id: ResourceId,
    ) -> AppResult<BTreeSet<F::Permission>> {
        let meta = self.require_resource_meta(caller, resource_id).await?;
        if self.is_tenant_admin(caller).await? {
            return Ok(F::Permission::all().iter().copied().collect());
        }

        let grants = self.caller_grants(caller, &[resource_id]).await?;
        Ok(effective_permissions(
            false,
            meta.auth_control_enabled,
            &grants,
        ))
    }
}
